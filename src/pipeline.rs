//! # Analysis pipeline
//!
//! A [`Pipeline`] is an ordered list of [`AnalysisStage`]s run over one [`Flight`]. It does
//! no scheduling: every stage checks its own preconditions, and the pipeline stops at the
//! first failure. After each stage the pipeline verifies that the stage marked itself as run.
//!
//! ## Standard order
//!
//! ```text
//! Distance → Circling → Thermals → WindDrift → StraightPhases
//! ```
//!
//! ## Example
//!
//! ```rust
//! use hifitime::Epoch;
//! use soaring_analysis::{fix::Fix, flight::Flight, pipeline::Pipeline, analysis::AnalysisParams};
//!
//! let t0 = Epoch::from_gregorian_utc_hms(2017, 1, 14, 11, 0, 0);
//! let fixes = vec![
//!     Fix::from_degrees(t0, -33.0, 19.0, 800.0),
//!     Fix::from_degrees(t0 + hifitime::Duration::from_seconds(10.0), -33.001, 19.0, 795.0),
//! ];
//!
//! let flight = Pipeline::standard(AnalysisParams::default())
//!     .run(Flight::new(1, fixes))
//!     .unwrap();
//! assert!(flight.is_straight_phases_analysis_complete);
//! ```
use tracing::{debug, info};

use crate::{
    analysis::{
        circling::CirclingAnalysis, distance::DistanceAnalysis,
        straight_phases::StraightPhaseAnalysis, thermals::ThermalAnalysis,
        wind_drift::WindDriftAnalysis, AnalysisParams, AnalysisStage,
    },
    analysis_errors::AnalysisError,
    fix::Fix,
    flight::Flight,
};

pub struct Pipeline {
    stages: Vec<Box<dyn AnalysisStage>>,
}

impl Pipeline {
    /// A pipeline without stages.
    pub fn empty() -> Self {
        Pipeline { stages: Vec::new() }
    }

    /// Distance, circling, thermals, wind drift and straight phases, sharing `params`.
    pub fn standard(params: AnalysisParams) -> Self {
        Pipeline::empty()
            .with_stage(Box::new(DistanceAnalysis))
            .with_stage(Box::new(CirclingAnalysis::new(params.clone())))
            .with_stage(Box::new(ThermalAnalysis))
            .with_stage(Box::new(WindDriftAnalysis::new(params.clone())))
            .with_stage(Box::new(StraightPhaseAnalysis::new(params)))
    }

    /// Append a stage after the existing ones.
    pub fn with_stage(mut self, stage: Box<dyn AnalysisStage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order over `flight`.
    ///
    /// Return
    /// ------
    /// * The first error raised by a stage. Stages before it keep their results, the failing
    ///   stage and the ones after it leave the flight untouched.
    pub fn run_on(&self, flight: &mut Flight) -> Result<(), AnalysisError> {
        for stage in &self.stages {
            let kind = stage.kind();
            debug!(flight = flight.id, stage = %kind, "running stage");
            stage.run(flight)?;
        }

        info!(
            flight = flight.id,
            fixes = flight.fixes.len(),
            distance_m = flight.total_track_distance,
            circles = flight.circles.len(),
            thermals = flight.thermals.len(),
            straight_phases = flight.straight_phases.len(),
            "flight analysed"
        );
        Ok(())
    }

    /// Consuming variant of [`Pipeline::run_on`].
    pub fn run(&self, mut flight: Flight) -> Result<Flight, AnalysisError> {
        self.run_on(&mut flight)?;
        Ok(flight)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline::standard(AnalysisParams::default())
    }
}

/// Analyse `fixes` with the standard pipeline and default parameters.
pub fn analyze(fixes: Vec<Fix>) -> Result<Flight, AnalysisError> {
    analyze_with(fixes, AnalysisParams::default())
}

/// Analyse `fixes` with the standard pipeline and the given parameters.
pub fn analyze_with(fixes: Vec<Fix>, params: AnalysisParams) -> Result<Flight, AnalysisError> {
    Pipeline::standard(params).run(Flight::new(0, fixes))
}

#[cfg(test)]
mod pipeline_test {
    use super::*;
    use crate::flight::AnalysisKind;

    /// Claims success without flipping its flag.
    struct ForgetfulStage;

    impl AnalysisStage for ForgetfulStage {
        fn kind(&self) -> AnalysisKind {
            AnalysisKind::Distance
        }

        fn perform_analysis(&self, _flight: &mut Flight) -> Result<(), AnalysisError> {
            Ok(())
        }
    }

    #[test]
    fn test_standard_pipeline_on_empty_flight() {
        let pipeline = Pipeline::default();
        assert_eq!(pipeline.len(), 5);

        let flight = pipeline.run(Flight::new(1, vec![])).unwrap();
        assert_eq!(flight.total_track_distance, 0.0);
        assert!(flight.circles.is_empty());
        assert!(flight.wind_drift.is_none());
        assert!(flight.straight_phases.is_empty());
        assert!(flight.is_straight_phases_analysis_complete);
        assert!(!flight.is_check_twice_analysis_complete);
    }

    #[test]
    fn test_unflipped_flag_is_a_failure() {
        let pipeline = Pipeline::empty().with_stage(Box::new(ForgetfulStage));
        assert!(matches!(
            pipeline.run(Flight::new(1, vec![])),
            Err(AnalysisError::AnalysisFailure(_))
        ));
    }

    #[test]
    fn test_out_of_order_stage_fails_first() {
        let pipeline = Pipeline::empty()
            .with_stage(Box::new(ThermalAnalysis))
            .with_stage(Box::new(DistanceAnalysis));
        let mut flight = Flight::new(1, vec![]);

        assert!(matches!(
            pipeline.run_on(&mut flight),
            Err(AnalysisError::PreconditionsFailed(_))
        ));
        assert!(!flight.is_distance_analysis_complete);
    }

    #[test]
    fn test_second_run_is_rejected() {
        let pipeline = Pipeline::default();
        let mut flight = Flight::new(1, vec![]);
        pipeline.run_on(&mut flight).unwrap();

        assert!(matches!(
            pipeline.run_on(&mut flight),
            Err(AnalysisError::PreconditionsFailed(_))
        ));

        flight.reset_analysis(AnalysisKind::Distance);
        assert!(!flight.is_circling_analysis_complete);
        pipeline.run_on(&mut flight).unwrap();
    }
}
