//! # Flight aggregate
//!
//! [`Flight`] holds the raw fix sequence and, as analysis stages complete, every result
//! they produce. A single value is threaded through the [`Pipeline`](crate::pipeline::Pipeline);
//! each stage owns the fields it writes and flips its own completion flag.
//!
//! ## Structure
//!
//! ```text
//! Flight
//! ├── fixes                  (input, read-only once built)
//! ├── total_track_distance   DistanceAnalysis
//! ├── circles                CirclingAnalysis  (drift fields: WindDriftAnalysis, verdicts: CheckTwiceAnalysis)
//! ├── thermals               ThermalAnalysis
//! ├── wind_drift             WindDriftAnalysis
//! └── straight_phases        StraightPhaseAnalysis
//! ```
//!
//! A stage whose flag is set refuses to run again. [`Flight::reset_analysis`] clears a
//! stage's outputs, and those of every stage built on top of it, so it can be re-run.
use serde::Serialize;

use crate::{
    analysis::{
        circling::{CheckTwiceRule, CirclingTurn},
        straight_phases::StraightPhase,
        thermals::Thermal,
        wind_drift::WindDrift,
    },
    constants::{Meter, Seconds},
    fix::{resolve_track, Fix},
};

/// The analysis stages a [`Flight`] can go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    Distance,
    Circling,
    Thermals,
    WindDrift,
    StraightPhases,
    CheckTwice,
}

impl AnalysisKind {
    /// Stages whose inputs come directly from this one.
    pub fn dependents(&self) -> &'static [AnalysisKind] {
        use AnalysisKind::*;
        match self {
            Distance => &[Circling],
            Circling => &[Thermals, WindDrift, CheckTwice],
            Thermals => &[StraightPhases],
            WindDrift | StraightPhases | CheckTwice => &[],
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AnalysisKind::Distance => "distance",
            AnalysisKind::Circling => "circling",
            AnalysisKind::Thermals => "thermals",
            AnalysisKind::WindDrift => "wind drift",
            AnalysisKind::StraightPhases => "straight phases",
            AnalysisKind::CheckTwice => "check-twice rule",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Default)]
pub struct Flight {
    pub id: u64,
    pub pilot_name: Option<String>,
    pub fixes: Vec<Fix>,

    pub is_distance_analysis_complete: bool,
    pub total_track_distance: Meter,

    pub is_circling_analysis_complete: bool,
    pub circles: Vec<CirclingTurn>,

    pub is_thermal_analysis_complete: bool,
    pub thermals: Vec<Thermal>,

    pub is_wind_analysis_complete: bool,
    pub wind_drift: Option<WindDrift>,

    pub is_straight_phases_analysis_complete: bool,
    pub straight_phases: Vec<StraightPhase>,

    pub is_check_twice_analysis_complete: bool,
}

/// Display projection of a [`Flight`], free of internal analysis state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightSummary {
    pub id: u64,
    pub total_track_distance: Meter,
}

impl Flight {
    /// Create a flight ready for analysis. Track courses and turn rates of the fixes are
    /// resolved here, once.
    pub fn new(id: u64, mut fixes: Vec<Fix>) -> Self {
        resolve_track(&mut fixes);
        Flight {
            id,
            fixes,
            ..Default::default()
        }
    }

    pub fn with_pilot(mut self, pilot_name: impl Into<String>) -> Self {
        self.pilot_name = Some(pilot_name.into());
        self
    }

    pub fn summary(&self) -> FlightSummary {
        FlightSummary {
            id: self.id,
            total_track_distance: self.total_track_distance,
        }
    }

    /// Seconds between the first and the last fix, 0 for fewer than two fixes.
    pub fn duration_s(&self) -> Seconds {
        match (self.fixes.first(), self.fixes.last()) {
            (Some(first), Some(last)) => last.seconds_since(first),
            _ => 0,
        }
    }

    pub fn is_complete(&self, kind: AnalysisKind) -> bool {
        match kind {
            AnalysisKind::Distance => self.is_distance_analysis_complete,
            AnalysisKind::Circling => self.is_circling_analysis_complete,
            AnalysisKind::Thermals => self.is_thermal_analysis_complete,
            AnalysisKind::WindDrift => self.is_wind_analysis_complete,
            AnalysisKind::StraightPhases => self.is_straight_phases_analysis_complete,
            AnalysisKind::CheckTwice => self.is_check_twice_analysis_complete,
        }
    }

    /// Forget the results of `kind` and of every stage depending on it.
    pub fn reset_analysis(&mut self, kind: AnalysisKind) {
        for dependent in kind.dependents() {
            self.reset_analysis(*dependent);
        }

        match kind {
            AnalysisKind::Distance => {
                self.total_track_distance = 0.0;
                self.is_distance_analysis_complete = false;
            }
            AnalysisKind::Circling => {
                self.circles.clear();
                self.is_circling_analysis_complete = false;
            }
            AnalysisKind::Thermals => {
                self.thermals.clear();
                for circle in self.circles.iter_mut() {
                    circle.included_in_thermal = false;
                }
                self.is_thermal_analysis_complete = false;
            }
            AnalysisKind::WindDrift => {
                self.wind_drift = None;
                for circle in self.circles.iter_mut() {
                    circle.drift = None;
                    circle.correction = None;
                }
                self.is_wind_analysis_complete = false;
            }
            AnalysisKind::StraightPhases => {
                self.straight_phases.clear();
                self.is_straight_phases_analysis_complete = false;
            }
            AnalysisKind::CheckTwice => {
                for circle in self.circles.iter_mut() {
                    circle.check_twice_rule = CheckTwiceRule::NotApplicable;
                }
                self.is_check_twice_analysis_complete = false;
            }
        }
    }
}
