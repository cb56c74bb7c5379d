use itertools::Itertools;
use tracing::debug;

use crate::{
    analysis::{require_not_run, AnalysisStage},
    analysis_errors::AnalysisError,
    constants::Meter,
    fix::Fix,
    flight::{AnalysisKind, Flight},
    geodesy::distance,
};

/// Total ground-track distance: the sum of great-circle distances between consecutive fixes.
///
/// This is the first stage of the pipeline, so it also rejects fix sequences whose timestamps
/// go backwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceAnalysis;

/// Sum of the distances between consecutive fixes, 0 for fewer than two fixes.
pub fn total_track_distance(fixes: &[Fix]) -> Meter {
    fixes
        .iter()
        .tuple_windows()
        .map(|(p1, p2)| distance(&p1.position, &p2.position))
        .sum()
}

impl AnalysisStage for DistanceAnalysis {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Distance
    }

    fn check_preconditions(&self, flight: &Flight) -> Result<(), AnalysisError> {
        require_not_run(flight, self)?;

        if let Some((i, _)) = flight
            .fixes
            .iter()
            .tuple_windows()
            .find_position(|(p1, p2)| p2.timestamp < p1.timestamp)
        {
            return Err(AnalysisError::PreconditionsFailed(format!(
                "fix timestamps go backwards after fix #{i}"
            )));
        }
        Ok(())
    }

    fn perform_analysis(&self, flight: &mut Flight) -> Result<(), AnalysisError> {
        let total = total_track_distance(&flight.fixes);
        debug!(flight = flight.id, fixes = flight.fixes.len(), total_m = total, "track distance");

        flight.total_track_distance = total;
        flight.is_distance_analysis_complete = true;
        Ok(())
    }
}
