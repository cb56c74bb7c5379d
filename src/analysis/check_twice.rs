//! Audit of the "check twice" centering rule: a pilot who re-centres a thermal should fly
//! the next circle unchanged before correcting again.
//!
//! Not part of [`Pipeline::standard`](crate::pipeline::Pipeline::standard); add it with
//! [`Pipeline::with_stage`](crate::pipeline::Pipeline::with_stage).
use tracing::debug;

use crate::{
    analysis::{
        circling::{CheckTwiceRule, CirclingTurn},
        require_complete, require_not_run, AnalysisStage,
    },
    analysis_errors::AnalysisError,
    flight::{AnalysisKind, Flight},
};

/// Give every turn its verdict.
///
/// A corrected turn is [`CheckTwiceRule::NotFollowed`] when the turn before it was corrected
/// too and [`CheckTwiceRule::Followed`] otherwise. The first turn counts as following a
/// corrected one. Uncorrected turns are [`CheckTwiceRule::NotApplicable`].
pub fn apply_check_twice_rule(circles: &mut [CirclingTurn]) {
    let mut previous_corrected = true;
    for circle in circles.iter_mut() {
        circle.check_twice_rule = match (circle.centering_correction, previous_corrected) {
            (true, true) => CheckTwiceRule::NotFollowed,
            (true, false) => CheckTwiceRule::Followed,
            (false, _) => CheckTwiceRule::NotApplicable,
        };
        previous_corrected = circle.centering_correction;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckTwiceAnalysis;

impl AnalysisStage for CheckTwiceAnalysis {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::CheckTwice
    }

    fn check_preconditions(&self, flight: &Flight) -> Result<(), AnalysisError> {
        require_not_run(flight, self)?;
        require_complete(flight, AnalysisKind::Circling, self.kind())
    }

    fn perform_analysis(&self, flight: &mut Flight) -> Result<(), AnalysisError> {
        apply_check_twice_rule(&mut flight.circles);

        let broken = flight
            .circles
            .iter()
            .filter(|c| c.check_twice_rule == CheckTwiceRule::NotFollowed)
            .count();
        debug!(flight = flight.id, circles = flight.circles.len(), broken, "check-twice audit");

        flight.is_check_twice_analysis_complete = true;
        Ok(())
    }
}
