//! # Straight phases
//!
//! The parts of the flight outside thermals are glides, but a glide may contain sharp turns
//! that never complete a circle (reversals, search patterns). Each non-thermal fix range is
//! scanned with a sliding time window and split wherever the course changes sharply.
//!
//! ## Ranges
//!
//! ```text
//! fixes   0 ────────── T1 ════ T1' ────────── T2 ════ T2' ────────── n-1
//!         └ before first ┘      └ between thermals ┘     └ after last ┘
//! ```
//!
//! Without thermals the whole flight is a single range.
//!
//! ## Splitting
//!
//! A head index walks the range fix by fix. Whenever the span from tail to head exceeds
//! `straight_window_s`, the tail is advanced until it doesn't, and the course change
//! between the tail and the head is measured:
//!
//! * above `straight_turn_angle`, the first fix of such a run splits the phase at the head,
//!   unless the phase so far spans no more than `straight_window_s` (tail relative to the
//!   phase start). Scanning continues from the split fix.
//! * at or below it, the run ends and a later sharp turn may split again.
use tracing::debug;

use crate::{
    analysis::{require_complete, require_not_run, AnalysisParams, AnalysisStage},
    analysis_errors::AnalysisError,
    constants::{Meter, Seconds},
    fix::Fix,
    flight::{AnalysisKind, Flight},
    geodesy::{bearing_delta, distance},
};

/// A glide between two fixes.
///
/// `distance` is the great-circle distance between the end fixes, not the length of the
/// path flown in between.
#[derive(Debug, Clone, PartialEq)]
pub struct StraightPhase {
    pub start_fix: usize,
    pub end_fix: usize,
    pub duration: Seconds,
    pub distance: Meter,
    /// m/s, 0 when the phase has no duration.
    pub ground_speed: f64,
}

impl StraightPhase {
    pub fn new(fixes: &[Fix], start_fix: usize, end_fix: usize) -> Result<Self, AnalysisError> {
        let (Some(start), Some(end)) = (fixes.get(start_fix), fixes.get(end_fix)) else {
            return Err(AnalysisError::AnalysisFailure(format!(
                "straight phase [{start_fix}, {end_fix}] outside of {} fixes",
                fixes.len()
            )));
        };

        let duration = end.seconds_since(start);
        let distance = distance(&start.position, &end.position);
        let ground_speed = if duration > 0 {
            distance / duration as f64
        } else {
            0.0
        };

        Ok(StraightPhase {
            start_fix,
            end_fix,
            duration,
            distance,
            ground_speed,
        })
    }

    /// Ground speed in km/h.
    pub fn ground_speed_kmh(&self) -> f64 {
        self.ground_speed * 3.6
    }
}

impl std::fmt::Display for StraightPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Fixes = [{}..{}], distance (m) = [{:.0}], speed (km/h) = [{:.1}]",
            self.start_fix,
            self.end_fix,
            self.distance,
            self.ground_speed_kmh()
        )
    }
}

/// Split the fix range `[start, end]` at sharp turns.
///
/// Return
/// ------
/// * The `(start, end)` fix index pairs of the resulting phases, in order, each sharing its
///   end fix with the next one's start.
pub fn split_into_sections(
    fixes: &[Fix],
    start: usize,
    end: usize,
    params: &AnalysisParams,
) -> Vec<(usize, usize)> {
    let window = params.straight_window_s;
    let span = |from: usize, to: usize| fixes[to].seconds_since(&fixes[from]);

    let mut sections = Vec::new();
    let mut phase_start = start;
    let mut tail = start;
    let mut continued_turn = false;

    for head in start + 1..=end {
        if span(tail, head) <= window {
            continue;
        }
        while span(tail, head) > window {
            tail += 1;
        }

        let (Some(tail_course), Some(head_course)) =
            (fixes[tail].track_course, fixes[head].track_course)
        else {
            continue;
        };

        if bearing_delta(tail_course, head_course).abs() > params.straight_turn_angle {
            if !continued_turn {
                continued_turn = true;
                if span(phase_start, tail) > window {
                    sections.push((phase_start, head));
                    phase_start = head;
                    tail = head;
                }
            }
        } else {
            continued_turn = false;
        }
    }

    sections.push((phase_start, end));
    sections
}

/// Fix ranges outside thermals, see the module docs.
fn glide_ranges(flight: &Flight) -> Vec<(usize, usize)> {
    let last = flight.fixes.len() - 1;
    let (Some(first_thermal), Some(last_thermal)) = (flight.thermals.first(), flight.thermals.last())
    else {
        return vec![(0, last)];
    };

    let mut ranges = vec![(0, first_thermal.start_fix)];
    ranges.extend(
        flight
            .thermals
            .windows(2)
            .map(|pair| (pair[0].end_fix, pair[1].start_fix)),
    );
    ranges.push((last_thermal.end_fix, last));
    ranges
}

/// Compute every straight phase of a flight with completed thermal analysis.
pub fn straight_phases(flight: &Flight, params: &AnalysisParams) -> Result<Vec<StraightPhase>, AnalysisError> {
    if flight.fixes.len() < 2 {
        return Ok(Vec::new());
    }

    let mut phases = Vec::new();
    for (start, end) in glide_ranges(flight) {
        if end >= flight.fixes.len() || start > end {
            return Err(AnalysisError::AnalysisFailure(format!(
                "glide range [{start}, {end}] is invalid for {} fixes",
                flight.fixes.len()
            )));
        }
        if start == end {
            continue;
        }

        for (s, e) in split_into_sections(&flight.fixes, start, end, params) {
            phases.push(StraightPhase::new(&flight.fixes, s, e)?);
        }
    }
    Ok(phases)
}

#[derive(Debug, Clone, Default)]
pub struct StraightPhaseAnalysis {
    params: AnalysisParams,
}

impl StraightPhaseAnalysis {
    pub fn new(params: AnalysisParams) -> Self {
        StraightPhaseAnalysis { params }
    }
}

impl AnalysisStage for StraightPhaseAnalysis {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::StraightPhases
    }

    fn check_preconditions(&self, flight: &Flight) -> Result<(), AnalysisError> {
        require_not_run(flight, self)?;
        require_complete(flight, AnalysisKind::Circling, self.kind())?;
        require_complete(flight, AnalysisKind::Thermals, self.kind())
    }

    fn perform_analysis(&self, flight: &mut Flight) -> Result<(), AnalysisError> {
        let phases = straight_phases(flight, &self.params)?;
        debug!(
            flight = flight.id,
            thermals = flight.thermals.len(),
            phases = phases.len(),
            "straight phase analysis"
        );

        flight.straight_phases = phases;
        flight.is_straight_phases_analysis_complete = true;
        Ok(())
    }
}

#[cfg(test)]
mod straight_phases_test {
    use super::*;
    use crate::{analysis::thermals::Thermal, geodesy::destination_point};
    use approx::assert_relative_eq;
    use hifitime::{Duration, Epoch};

    /// One fix per second at 25 m/s, the heading changing by `increments[k]` before step k.
    fn track(increments: &[f64]) -> Vec<Fix> {
        let t0 = Epoch::from_gregorian_utc_hms(2019, 7, 2, 13, 0, 0);
        let mut fix = Fix::from_degrees(t0, -33.1, 19.2, 1200.0);
        let mut heading = 10.0;
        let mut fixes = vec![fix.clone()];
        for inc in increments {
            heading += inc;
            fix = Fix {
                timestamp: fix.timestamp + Duration::from_seconds(1.0),
                position: destination_point(&fix.position, heading, 25.0),
                ..fix
            };
            fixes.push(fix.clone());
        }
        fixes
    }

    fn glide(parts: &[(usize, f64)]) -> Flight {
        let increments: Vec<f64> = parts
            .iter()
            .flat_map(|&(n, inc)| std::iter::repeat(inc).take(n))
            .collect();
        let mut flight = Flight::new(4, track(&increments));
        flight.is_circling_analysis_complete = true;
        flight.is_thermal_analysis_complete = true;
        flight
    }

    #[test]
    fn test_sustained_turn_splits() {
        let flight = glide(&[(60, 0.0), (12, 7.5), (60, 0.0)]);
        let sections = split_into_sections(&flight.fixes, 0, 132, &AnalysisParams::default());
        assert_eq!(sections, vec![(0, 66), (66, 132)]);
    }

    #[test]
    fn test_early_turn_does_not_split() {
        let flight = glide(&[(3, 0.0), (12, 7.5), (60, 0.0)]);
        let sections = split_into_sections(&flight.fixes, 0, 75, &AnalysisParams::default());
        assert_eq!(sections, vec![(0, 75)]);
    }

    #[test]
    fn test_two_turns_split_twice() {
        let mut flight = glide(&[(60, 0.0), (12, 7.5), (60, 0.0), (12, -7.5), (60, 0.0)]);
        StraightPhaseAnalysis::default().run(&mut flight).unwrap();

        let bounds: Vec<_> = flight
            .straight_phases
            .iter()
            .map(|p| (p.start_fix, p.end_fix))
            .collect();
        assert_eq!(bounds, vec![(0, 66), (66, 139), (139, 204)]);
    }

    #[test]
    fn test_phase_speed_on_straight_glide() {
        let mut flight = glide(&[(40, 0.0)]);
        StraightPhaseAnalysis::default().run(&mut flight).unwrap();

        assert_eq!(flight.straight_phases.len(), 1);
        let phase = &flight.straight_phases[0];
        assert_eq!(phase.duration, 40);
        assert_relative_eq!(phase.distance, 1000.0, max_relative = 1e-6);
        assert_relative_eq!(phase.ground_speed, 25.0, max_relative = 1e-6);
        assert_relative_eq!(phase.ground_speed_kmh(), 90.0, max_relative = 1e-6);
    }

    #[test]
    fn test_ranges_around_thermals() {
        let mut flight = glide(&[(100, 0.0)]);
        let thermal = |start_fix: usize, end_fix: usize| Thermal {
            circles: 0..1,
            start_fix,
            end_fix,
            start_time: flight.fixes[start_fix].timestamp,
            total_duration_s: (end_fix - start_fix) as Seconds,
            altitude_gain: 0.0,
        };
        flight.thermals = vec![thermal(0, 20), thermal(40, 60)];

        assert_eq!(glide_ranges(&flight), vec![(0, 0), (20, 40), (60, 100)]);

        let phases = straight_phases(&flight, &AnalysisParams::default()).unwrap();
        let bounds: Vec<_> = phases.iter().map(|p| (p.start_fix, p.end_fix)).collect();
        assert_eq!(bounds, vec![(20, 40), (60, 100)]);
    }

    #[test]
    fn test_out_of_range_thermal_fails() {
        let mut flight = glide(&[(10, 0.0)]);
        flight.thermals = vec![Thermal {
            circles: 0..1,
            start_fix: 2,
            end_fix: 50,
            start_time: flight.fixes[2].timestamp,
            total_duration_s: 48,
            altitude_gain: 0.0,
        }];

        assert!(matches!(
            StraightPhaseAnalysis::default().run(&mut flight),
            Err(AnalysisError::AnalysisFailure(_))
        ));
        assert!(!flight.is_straight_phases_analysis_complete);
    }

    #[test]
    fn test_requires_thermals() {
        let mut flight = Flight::new(5, track(&[0.0; 5]));
        flight.is_circling_analysis_complete = true;
        assert!(matches!(
            StraightPhaseAnalysis::default().run(&mut flight),
            Err(AnalysisError::PreconditionsFailed(_))
        ));
    }

    #[test]
    fn test_single_fix_has_no_phase() {
        let mut flight = glide(&[]);
        StraightPhaseAnalysis::default().run(&mut flight).unwrap();
        assert!(flight.straight_phases.is_empty());
    }
}
