//! # CSV track files
//!
//! Loads fixes from a headed CSV file, one fix per row:
//!
//! ```text
//! time,latitude,longitude,altitude
//! 2017-01-14T11:02:10 UTC,-33.1143,19.2017,1042
//! ```
//!
//! `time` is any representation [`hifitime::Epoch`] parses from a string (Gregorian ISO 8601
//! with an optional time scale suffix, `UTC` being assumed when absent). Coordinates are
//! decimal degrees, altitude is in meters. Rows must already be in time order; the reader
//! does not sort them.
use std::{fs::File, io::Read, str::FromStr};

use camino::Utf8Path;
use hifitime::Epoch;
use serde::Deserialize;
use tracing::debug;

use crate::{analysis_errors::AnalysisError, fix::Fix};

#[derive(Debug, Deserialize)]
struct TrackRecord {
    time: String,
    latitude: f64,
    longitude: f64,
    altitude: f64,
}

impl TryFrom<TrackRecord> for Fix {
    type Error = AnalysisError;

    fn try_from(record: TrackRecord) -> Result<Self, Self::Error> {
        let timestamp = Epoch::from_str(record.time.trim())
            .map_err(|e| AnalysisError::InvalidTimestamp(format!("{}: {e}", record.time)))?;
        Ok(Fix::from_degrees(
            timestamp,
            record.latitude,
            record.longitude,
            record.altitude,
        ))
    }
}

/// Read fixes from any CSV source.
///
/// Arguments
/// ---------
/// * `reader` – CSV content with a `time,latitude,longitude,altitude` header.
///
/// Return
/// ------
/// * The fixes in file order, or the first malformed row as
///   [`AnalysisError::CsvError`] / [`AnalysisError::InvalidTimestamp`].
pub fn read_fixes_from_reader(reader: impl Read) -> Result<Vec<Fix>, AnalysisError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize::<TrackRecord>()
        .map(|record| Fix::try_from(record?))
        .collect()
}

/// Read fixes from a CSV file on disk, see [`read_fixes_from_reader`].
pub fn read_fixes_csv(path: &Utf8Path) -> Result<Vec<Fix>, AnalysisError> {
    let fixes = read_fixes_from_reader(File::open(path)?)?;
    debug!(%path, fixes = fixes.len(), "track loaded");
    Ok(fixes)
}
