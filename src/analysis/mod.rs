//! # Flight analysis stages and their parameters
//!
//! This module defines the [`AnalysisStage`] protocol implemented by every stage of the
//! [`Pipeline`](crate::pipeline::Pipeline), and the [`AnalysisParams`] configuration struct
//! (with its validating builder) that carries all tunable thresholds.
//!
//! ## Stages
//!
//! 1. [`DistanceAnalysis`](crate::analysis::distance::DistanceAnalysis) – total ground-track distance.
//! 2. [`CirclingAnalysis`](crate::analysis::circling::CirclingAnalysis) – full 360° turns from turn rate.
//! 3. [`ThermalAnalysis`](crate::analysis::thermals::ThermalAnalysis) – adjacent turns grouped into thermals.
//! 4. [`WindDriftAnalysis`](crate::analysis::wind_drift::WindDriftAnalysis) – trimmed average drift
//!    between circle starts, and per-circle correction vectors.
//! 5. [`StraightPhaseAnalysis`](crate::analysis::straight_phases::StraightPhaseAnalysis) – glides between
//!    thermals, split at sharp non-circling turns.
//! 6. [`CheckTwiceAnalysis`](crate::analysis::check_twice::CheckTwiceAnalysis) – optional audit of
//!    centering corrections, not part of the standard pipeline.
//!
//! ## Example
//!
//! ```rust
//! use soaring_analysis::analysis::AnalysisParams;
//!
//! let params = AnalysisParams::builder()
//!     .turn_rate_threshold(5.0)
//!     .straight_window_s(12)
//!     .build()
//!     .unwrap();
//!
//! println!("{params:#}");
//! ```
use std::cmp::Ordering::{Equal, Greater, Less};
use std::fmt;

use crate::{
    analysis_errors::AnalysisError,
    constants::{
        Degree, DegreePerSecond, Meter, Seconds, CENTERING_DIP_TOLERANCE_SECONDS,
        MAX_DRIFT_BEARING_DEVIATION, MAX_DRIFT_DISTANCE_DEVIATION, STRAIGHT_TURN_ANGLE,
        STRAIGHT_WINDOW_SECONDS, TURN_RATE_THRESHOLD,
    },
    flight::{AnalysisKind, Flight},
};

pub mod check_twice;
pub mod circling;
pub mod distance;
pub mod straight_phases;
pub mod thermals;
pub mod wind_drift;

/// One step of the flight analysis.
///
/// A stage declares which [`Flight`] state it needs ([`check_preconditions`](AnalysisStage::check_preconditions)),
/// computes its results ([`perform_analysis`](AnalysisStage::perform_analysis)) and reports whether it
/// already ran ([`has_been_run`](AnalysisStage::has_been_run)). Implementations compute into locals and
/// only write to the flight once nothing can fail anymore, so a failed stage leaves its fields and its
/// flag untouched.
pub trait AnalysisStage {
    fn kind(&self) -> AnalysisKind;

    fn has_been_run(&self, flight: &Flight) -> bool {
        flight.is_complete(self.kind())
    }

    /// Fail with [`AnalysisError::PreconditionsFailed`] when the flight is not ready for this stage.
    ///
    /// The default implementation only rejects a stage that already ran; stages with inputs
    /// extend it.
    fn check_preconditions(&self, flight: &Flight) -> Result<(), AnalysisError> {
        require_not_run(flight, self)
    }

    fn perform_analysis(&self, flight: &mut Flight) -> Result<(), AnalysisError>;

    /// Check preconditions, perform the analysis and verify the completion flag flipped.
    fn run(&self, flight: &mut Flight) -> Result<(), AnalysisError> {
        self.check_preconditions(flight)?;
        self.perform_analysis(flight)?;

        if !self.has_been_run(flight) {
            return Err(AnalysisError::AnalysisFailure(format!(
                "{} analysis did not mark flight {} as complete",
                self.kind(),
                flight.id
            )));
        }
        Ok(())
    }
}

/// Shared precondition: `stage` must not have run on `flight` yet.
pub(crate) fn require_not_run<S: AnalysisStage + ?Sized>(
    flight: &Flight,
    stage: &S,
) -> Result<(), AnalysisError> {
    if stage.has_been_run(flight) {
        Err(AnalysisError::PreconditionsFailed(format!(
            "{} analysis has already been run on flight {}",
            stage.kind(),
            flight.id
        )))
    } else {
        Ok(())
    }
}

/// Shared precondition: `kind` must have completed on `flight` before `stage` runs.
pub(crate) fn require_complete(
    flight: &Flight,
    kind: AnalysisKind,
    stage: AnalysisKind,
) -> Result<(), AnalysisError> {
    if flight.is_complete(kind) {
        Ok(())
    } else {
        Err(AnalysisError::PreconditionsFailed(format!(
            "{kind} analysis must be completed before {stage} analysis"
        )))
    }
}

/// Tunable thresholds of the flight analysis.
///
/// Fields
/// -----------------
/// **Circling detection**
/// * `turn_rate_threshold` – turn rate (°/s) separating thermalling from cruising.
/// * `centering_dip_tolerance_s` – how long (s) the turn rate may dip below the threshold,
///   without changing sign, before the turn is abandoned. `0` makes detection strict: any
///   sub-threshold rate ends the turn.
///
/// **Wind drift**
/// * `max_drift_bearing_deviation` – drift bearings further (°) from the mean are trimmed.
/// * `max_drift_distance_deviation` – drift distances further (m) from the mean are trimmed.
///
/// **Straight phases**
/// * `straight_window_s` – span (s) of the sliding window over which course change is measured.
/// * `straight_turn_angle` – course change (°) over the window that marks a sharp turn.
///
/// Defaults
/// -----------------
/// * `turn_rate_threshold`: 4.0 °/s
/// * `centering_dip_tolerance_s`: 5 s
/// * `max_drift_bearing_deviation`: 5.0 °
/// * `max_drift_distance_deviation`: 10.0 m
/// * `straight_window_s`: 10 s
/// * `straight_turn_angle`: 45.0 °
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParams {
    // --- Circling detection ---
    pub turn_rate_threshold: DegreePerSecond,
    pub centering_dip_tolerance_s: Seconds,

    // --- Wind drift ---
    pub max_drift_bearing_deviation: Degree,
    pub max_drift_distance_deviation: Meter,

    // --- Straight phases ---
    pub straight_window_s: Seconds,
    pub straight_turn_angle: Degree,
}

impl AnalysisParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> AnalysisParamsBuilder {
        AnalysisParamsBuilder::new()
    }
}

impl Default for AnalysisParams {
    fn default() -> Self {
        AnalysisParams {
            turn_rate_threshold: TURN_RATE_THRESHOLD,
            centering_dip_tolerance_s: CENTERING_DIP_TOLERANCE_SECONDS,

            max_drift_bearing_deviation: MAX_DRIFT_BEARING_DEVIATION,
            max_drift_distance_deviation: MAX_DRIFT_DISTANCE_DEVIATION,

            straight_window_s: STRAIGHT_WINDOW_SECONDS,
            straight_turn_angle: STRAIGHT_TURN_ANGLE,
        }
    }
}

/// Builder for [`AnalysisParams`], with validation.
#[derive(Debug, Clone)]
pub struct AnalysisParamsBuilder {
    params: AnalysisParams,
}

impl Default for AnalysisParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: AnalysisParams::default(),
        }
    }

    // --- Circling detection ---
    pub fn turn_rate_threshold(mut self, v: DegreePerSecond) -> Self {
        self.params.turn_rate_threshold = v;
        self
    }
    pub fn centering_dip_tolerance_s(mut self, v: Seconds) -> Self {
        self.params.centering_dip_tolerance_s = v;
        self
    }

    // --- Wind drift ---
    pub fn max_drift_bearing_deviation(mut self, v: Degree) -> Self {
        self.params.max_drift_bearing_deviation = v;
        self
    }
    pub fn max_drift_distance_deviation(mut self, v: Meter) -> Self {
        self.params.max_drift_distance_deviation = v;
        self
    }

    // --- Straight phases ---
    pub fn straight_window_s(mut self, v: Seconds) -> Self {
        self.params.straight_window_s = v;
        self
    }
    pub fn straight_turn_angle(mut self, v: Degree) -> Self {
        self.params.straight_turn_angle = v;
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Return true iff x >= 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn ge0(x: f64) -> bool {
        matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
    }

    /// Return true iff a <= b and comparable (i.e., not NaN).
    #[inline]
    fn le(a: f64, b: f64) -> bool {
        matches!(a.partial_cmp(&b), Some(Less) | Some(Equal))
    }

    /// Validate and produce the [`AnalysisParams`].
    ///
    /// Validation rules
    /// -----------------
    /// * `turn_rate_threshold > 0`
    /// * `centering_dip_tolerance_s >= 0`
    /// * `max_drift_bearing_deviation >= 0`, `max_drift_distance_deviation >= 0`
    /// * `straight_window_s >= 1`
    /// * `0 < straight_turn_angle <= 180`
    ///
    /// Returns
    /// -----------------
    /// * `Err(AnalysisError::InvalidParameter)` naming the first rule that failed.
    pub fn build(self) -> Result<AnalysisParams, AnalysisError> {
        let p = &self.params;

        if !Self::gt0(p.turn_rate_threshold) {
            return Err(AnalysisError::InvalidParameter(
                "turn_rate_threshold must be > 0".into(),
            ));
        }
        if p.centering_dip_tolerance_s < 0 {
            return Err(AnalysisError::InvalidParameter(
                "centering_dip_tolerance_s must be >= 0".into(),
            ));
        }
        if !Self::ge0(p.max_drift_bearing_deviation) {
            return Err(AnalysisError::InvalidParameter(
                "max_drift_bearing_deviation must be >= 0".into(),
            ));
        }
        if !Self::ge0(p.max_drift_distance_deviation) {
            return Err(AnalysisError::InvalidParameter(
                "max_drift_distance_deviation must be >= 0".into(),
            ));
        }
        if p.straight_window_s < 1 {
            return Err(AnalysisError::InvalidParameter(
                "straight_window_s must be >= 1".into(),
            ));
        }
        if !(Self::gt0(p.straight_turn_angle) && Self::le(p.straight_turn_angle, 180.0)) {
            return Err(AnalysisError::InvalidParameter(
                "straight_turn_angle must be in (0, 180]".into(),
            ));
        }

        Ok(self.params)
    }
}

impl fmt::Display for AnalysisParams {
    /// Compact one-liner by default, one field per line with `{:#}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "AnalysisParams")?;
            writeln!(f, "[Circling detection]")?;
            writeln!(
                f,
                "  turn_rate_threshold          = {:.2} °/s",
                self.turn_rate_threshold
            )?;
            writeln!(
                f,
                "  centering_dip_tolerance_s    = {} s",
                self.centering_dip_tolerance_s
            )?;
            writeln!(f, "[Wind drift]")?;
            writeln!(
                f,
                "  max_drift_bearing_deviation  = {:.2} °",
                self.max_drift_bearing_deviation
            )?;
            writeln!(
                f,
                "  max_drift_distance_deviation = {:.2} m",
                self.max_drift_distance_deviation
            )?;
            writeln!(f, "[Straight phases]")?;
            writeln!(
                f,
                "  straight_window_s            = {} s",
                self.straight_window_s
            )?;
            write!(
                f,
                "  straight_turn_angle          = {:.2} °",
                self.straight_turn_angle
            )
        } else {
            write!(
                f,
                "AnalysisParams(turn_rate>{:.1}°/s, dip≤{}s, drift±{:.1}°/±{:.1}m, window={}s, sharp>{:.1}°)",
                self.turn_rate_threshold,
                self.centering_dip_tolerance_s,
                self.max_drift_bearing_deviation,
                self.max_drift_distance_deviation,
                self.straight_window_s,
                self.straight_turn_angle,
            )
        }
    }
}
