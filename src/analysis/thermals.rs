//! # Thermal aggregation
//!
//! Groups the circles found by [`CirclingAnalysis`](crate::analysis::circling::CirclingAnalysis)
//! into thermals. Two consecutive circles belong to the same thermal when the first one ends
//! exactly when the second one starts (`start + duration == next start`, whole seconds, no
//! tolerance). A circle with no adjacent neighbour forms a thermal of its own.
use std::ops::Range;

use hifitime::Epoch;
use tracing::debug;

use crate::{
    analysis::{circling::CirclingTurn, require_complete, require_not_run, AnalysisStage},
    analysis_errors::AnalysisError,
    constants::{Meter, Seconds},
    flight::{AnalysisKind, Flight},
};

/// A run of temporally adjacent circles.
///
/// `circles` is the range of the member circles in the flight's circle list, `start_fix` and
/// `end_fix` index the first circle's start and the last circle's end in the flight's fixes.
#[derive(Debug, Clone, PartialEq)]
pub struct Thermal {
    pub circles: Range<usize>,
    pub start_fix: usize,
    pub end_fix: usize,
    pub start_time: Epoch,
    pub total_duration_s: Seconds,
    pub altitude_gain: Meter,
}

impl Thermal {
    /// Build a thermal over `members`, which must be non-empty.
    fn from_circles(circles: &[CirclingTurn], members: Range<usize>) -> Option<Self> {
        let group = circles.get(members.clone())?;
        let (first, last) = (group.first()?, group.last()?);

        Some(Thermal {
            circles: members,
            start_fix: first.start_fix,
            end_fix: last.end_fix,
            start_time: first.timestamp,
            total_duration_s: group.iter().map(|c| c.duration).sum(),
            altitude_gain: last.end_altitude - first.start_altitude,
        })
    }

    pub fn circle_count(&self) -> usize {
        self.circles.len()
    }

    /// Member circles, resolved against the flight's circle list.
    pub fn circles_in<'a>(&self, circles: &'a [CirclingTurn]) -> &'a [CirclingTurn] {
        circles.get(self.circles.clone()).unwrap_or(&[])
    }

    /// Total duration divided by the circle count, rounded to the nearest second.
    pub fn average_circle_duration(&self) -> Seconds {
        let count = self.circle_count() as f64;
        if count == 0.0 {
            return 0;
        }
        (self.total_duration_s as f64 / count).round() as Seconds
    }

    /// Average vertical speed over the thermal in m/s.
    pub fn average_climb_rate(&self) -> f64 {
        if self.total_duration_s > 0 {
            self.altitude_gain / self.total_duration_s as f64
        } else {
            0.0
        }
    }

    /// Total duration as `M:SS`, or `H:MM:SS` once it reaches an hour.
    pub fn total_duration(&self) -> String {
        format_duration(self.total_duration_s)
    }
}

impl std::fmt::Display for Thermal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Circles = [{}], duration = [{}], average circle (s) = [{}]",
            self.circle_count(),
            self.total_duration(),
            self.average_circle_duration()
        )
    }
}

/// Format whole seconds as `M:SS`, with hours prepended (`H:MM:SS`) only when non-zero.
pub fn format_duration(seconds: Seconds) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Do `c2` start exactly when `c1` ends?
pub fn are_adjacent(c1: &CirclingTurn, c2: &CirclingTurn) -> bool {
    c1.timestamp + hifitime::Duration::from_seconds(c1.duration as f64) == c2.timestamp
}

/// Split the ordered circle list into thermals of adjacent circles.
pub fn aggregate_thermals(circles: &[CirclingTurn]) -> Vec<Thermal> {
    let mut thermals = Vec::new();
    let mut group_start = 0;

    for i in 1..=circles.len() {
        let breaks = i == circles.len() || !are_adjacent(&circles[i - 1], &circles[i]);
        if breaks {
            thermals.extend(Thermal::from_circles(circles, group_start..i));
            group_start = i;
        }
    }
    thermals
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThermalAnalysis;

impl AnalysisStage for ThermalAnalysis {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Thermals
    }

    fn check_preconditions(&self, flight: &Flight) -> Result<(), AnalysisError> {
        require_not_run(flight, self)?;
        require_complete(flight, AnalysisKind::Circling, self.kind())
    }

    fn perform_analysis(&self, flight: &mut Flight) -> Result<(), AnalysisError> {
        let thermals = aggregate_thermals(&flight.circles);
        debug!(
            flight = flight.id,
            circles = flight.circles.len(),
            thermals = thermals.len(),
            "thermal analysis"
        );

        for thermal in &thermals {
            for circle in &mut flight.circles[thermal.circles.clone()] {
                circle.included_in_thermal = true;
            }
        }
        flight.thermals = thermals;
        flight.is_thermal_analysis_complete = true;
        Ok(())
    }
}
