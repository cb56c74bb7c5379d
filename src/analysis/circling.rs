//! # Circling detection
//!
//! Finds every completed 360° turn in a flight with a small state machine driven by the
//! turn rate of consecutive fixes.
//!
//! ## State machine
//!
//! ```text
//!                 rate > +T                         |rate| < T
//!   CRUISING ─────────────────▶ TURNING_RIGHT ─────────────────▶ CRUISING
//!      │                           │     ▲
//!      │ rate < -T        rate < -T│     │rate > +T   (reversal: restart the turn)
//!      ▼                           ▼     │
//!   TURNING_LEFT ◀───────────────────────┘
//! ```
//!
//! While the mode holds, every fix checks whether the course has swept past the course the
//! turn started on. When it has, the turn is closed at that fix and a successor opens at the
//! very same fix, keeping the first start course. Strings of circles therefore share their
//! end and start fixes, which is what [`ThermalAnalysis`](crate::analysis::thermals::ThermalAnalysis)
//! relies on to group them.
//!
//! Turns that never sweep past their start course (S-turns, aborted turns) are dropped
//! before a [`CirclingTurn`] is ever built. A fix recorded at the same second as its
//! predecessor has no turn rate: it leaves the mode alone but still takes part in the
//! crossing test.
//!
//! ## Centering moves
//!
//! A dip of the turn rate below the threshold that keeps its sign and ends within
//! [`AnalysisParams::centering_dip_tolerance_s`] (5 s by default) does not abandon the turn;
//! the turn is flagged with `centering_correction` instead. A tolerance of 0 abandons the turn
//! at the first sub-threshold rate.
use hifitime::Epoch;
use tracing::{debug, trace};

use crate::{
    analysis::{
        require_complete, require_not_run, wind_drift::DriftVector, AnalysisParams,
        AnalysisStage,
    },
    analysis_errors::AnalysisError,
    constants::{Degree, Meter, Seconds},
    fix::Fix,
    flight::{AnalysisKind, Flight},
    geodesy::{bearing_delta, normalize_bearing, GeoPoint},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    /// +1 for right (clockwise) turns, -1 for left turns.
    pub fn sign(&self) -> f64 {
        match self {
            TurnDirection::Left => -1.0,
            TurnDirection::Right => 1.0,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            TurnDirection::Left => TurnDirection::Right,
            TurnDirection::Right => TurnDirection::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightMode {
    Cruising,
    TurningLeft,
    TurningRight,
}

impl From<TurnDirection> for FlightMode {
    fn from(direction: TurnDirection) -> Self {
        match direction {
            TurnDirection::Left => FlightMode::TurningLeft,
            TurnDirection::Right => FlightMode::TurningRight,
        }
    }
}

/// Verdict of the check-twice rule for a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckTwiceRule {
    Followed,
    NotFollowed,
    #[default]
    NotApplicable,
}

/// One completed 360° turn.
///
/// `start_fix` and `end_fix` index into the owning flight's fixes.
#[derive(Debug, Clone, PartialEq)]
pub struct CirclingTurn {
    pub start_fix: usize,
    pub end_fix: usize,
    pub timestamp: Epoch,
    pub duration: Seconds,
    pub direction: TurnDirection,
    pub start_course: Degree,
    pub start_position: GeoPoint,
    pub start_altitude: Meter,
    pub end_altitude: Meter,
    pub included_in_thermal: bool,
    pub centering_correction: bool,
    pub check_twice_rule: CheckTwiceRule,
    /// Displacement from the previous turn's start, set by wind drift analysis
    pub drift: Option<DriftVector>,
    /// Offset from the start predicted by the average drift, set by wind drift analysis
    pub correction: Option<DriftVector>,
}

impl CirclingTurn {
    pub fn end_timestamp(&self) -> Epoch {
        self.timestamp + hifitime::Duration::from_seconds(self.duration as f64)
    }

    pub fn altitude_change(&self) -> Meter {
        self.end_altitude - self.start_altitude
    }

    /// Average vertical speed over the turn in m/s.
    pub fn climb_rate(&self) -> f64 {
        if self.duration > 0 {
            self.altitude_change() / self.duration as f64
        } else {
            0.0
        }
    }

    /// UTC time of day the turn started, `HH:MM:SS`.
    pub fn start_time_of_day(&self) -> String {
        let (_, _, _, h, m, s, _) = self.timestamp.to_gregorian_utc();
        format!("{h:02}:{m:02}:{s:02}")
    }
}

impl std::fmt::Display for CirclingTurn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Duration (s) = [{:02}]", self.duration)
    }
}

#[derive(Debug, Clone)]
struct TurnInProgress {
    start_fix: usize,
    direction: TurnDirection,
    start_course: Degree,
    /// Last fix at which the rate was above threshold, while a centering dip is running
    dip_since: Option<Epoch>,
    centering_correction: bool,
}

impl TurnInProgress {
    fn open(start_fix: usize, direction: TurnDirection, start_course: Degree) -> Self {
        TurnInProgress {
            start_fix,
            direction,
            start_course,
            dip_since: None,
            centering_correction: false,
        }
    }

    fn close(&self, fixes: &[Fix], end_fix: usize) -> CirclingTurn {
        let start = &fixes[self.start_fix];
        let end = &fixes[end_fix];
        CirclingTurn {
            start_fix: self.start_fix,
            end_fix,
            timestamp: start.timestamp,
            duration: end.seconds_since(start),
            direction: self.direction,
            start_course: self.start_course,
            start_position: start.position,
            start_altitude: start.altitude,
            end_altitude: end.altitude,
            included_in_thermal: false,
            centering_correction: self.centering_correction,
            check_twice_rule: CheckTwiceRule::NotApplicable,
            drift: None,
            correction: None,
        }
    }
}

/// Has the course swept past `start_course` while turning from `prev_course` to `course`?
///
/// The start course must lie strictly ahead of the previous course and no further than the
/// current one, measured in the direction of the turn.
pub fn crossed_start_course(
    direction: TurnDirection,
    start_course: Degree,
    prev_course: Degree,
    course: Degree,
) -> bool {
    let s = direction.sign();
    let swept = s * bearing_delta(prev_course, course);
    let offset = normalize_bearing(s * (start_course - prev_course));
    swept > 0.0 && offset > 0.0 && offset <= swept
}

/// Turn-rate state machine over an ordered, resolved fix sequence.
pub struct CirclingDetector<'a> {
    params: &'a AnalysisParams,
    fixes: &'a [Fix],
    mode: FlightMode,
    turn: Option<TurnInProgress>,
    circles: Vec<CirclingTurn>,
}

impl<'a> CirclingDetector<'a> {
    pub fn new(fixes: &'a [Fix], params: &'a AnalysisParams) -> Self {
        CirclingDetector {
            params,
            fixes,
            mode: FlightMode::Cruising,
            turn: None,
            circles: Vec::new(),
        }
    }

    /// Feed every fix pair through the state machine and return the completed turns.
    pub fn detect(mut self) -> Result<Vec<CirclingTurn>, AnalysisError> {
        for i in 1..self.fixes.len() {
            self.step(i)?;
        }
        Ok(self.circles)
    }

    fn start_turn(&mut self, i: usize, direction: TurnDirection, course: Degree) {
        trace!(fix = i, ?direction, course, "turn started");
        self.mode = direction.into();
        self.turn = Some(TurnInProgress::open(i, direction, course));
    }

    fn abandon_turn(&mut self, i: usize) {
        trace!(fix = i, "turn abandoned, cruising");
        self.mode = FlightMode::Cruising;
        self.turn = None;
    }

    fn step(&mut self, i: usize) -> Result<(), AnalysisError> {
        let fixes = self.fixes;
        let fix = &fixes[i];
        let (Some(course), Some(prev_course)) = (fix.track_course, fixes[i - 1].track_course)
        else {
            return Ok(());
        };
        let threshold = self.params.turn_rate_threshold;

        let direction = match self.mode {
            FlightMode::Cruising => {
                match fix.turn_rate {
                    Some(rate) if rate > threshold => {
                        self.start_turn(i, TurnDirection::Right, course)
                    }
                    Some(rate) if rate < -threshold => {
                        self.start_turn(i, TurnDirection::Left, course)
                    }
                    _ => {}
                }
                return Ok(());
            }
            FlightMode::TurningLeft => TurnDirection::Left,
            FlightMode::TurningRight => TurnDirection::Right,
        };

        if let Some(rate) = fix.turn_rate {
            if rate.abs() > threshold && rate * direction.sign() < 0.0 {
                // reversal: partial progress is lost
                self.start_turn(i, direction.opposite(), course);
                return Ok(());
            }
        }

        let tolerance = self.params.centering_dip_tolerance_s as f64;
        let Some(turn) = self.turn.as_mut() else {
            return Err(AnalysisError::AnalysisFailure(format!(
                "flight mode {:?} at fix #{i} has no turn in progress",
                self.mode
            )));
        };

        match fix.turn_rate {
            // repeated timestamp: no rate, but the course may still close the turn
            None => {}
            Some(rate) if rate.abs() < threshold => {
                let since = *turn.dip_since.get_or_insert(fixes[i - 1].timestamp);
                let dip = (fix.timestamp - since).to_seconds();
                if rate * direction.sign() > 0.0 && dip <= tolerance {
                    turn.centering_correction = true;
                } else {
                    self.abandon_turn(i);
                    return Ok(());
                }
            }
            Some(_) => turn.dip_since = None,
        }

        if crossed_start_course(direction, turn.start_course, prev_course, course) {
            let circle = turn.close(fixes, i);
            trace!(fix = i, duration = circle.duration, ?direction, "circle completed");
            let start_course = turn.start_course;
            self.circles.push(circle);
            self.turn = Some(TurnInProgress::open(i, direction, start_course));
        }
        Ok(())
    }
}

/// Detect all completed circles of a fix sequence.
pub fn detect_circles(fixes: &[Fix], params: &AnalysisParams) -> Result<Vec<CirclingTurn>, AnalysisError> {
    CirclingDetector::new(fixes, params).detect()
}

/// Stage wrapper around [`CirclingDetector`].
#[derive(Debug, Clone, Default)]
pub struct CirclingAnalysis {
    params: AnalysisParams,
}

impl CirclingAnalysis {
    pub fn new(params: AnalysisParams) -> Self {
        CirclingAnalysis { params }
    }
}

impl AnalysisStage for CirclingAnalysis {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Circling
    }

    fn check_preconditions(&self, flight: &Flight) -> Result<(), AnalysisError> {
        require_not_run(flight, self)?;
        require_complete(flight, AnalysisKind::Distance, self.kind())
    }

    fn perform_analysis(&self, flight: &mut Flight) -> Result<(), AnalysisError> {
        let circles = detect_circles(&flight.fixes, &self.params)?;
        debug!(flight = flight.id, circles = circles.len(), "circling analysis");

        flight.circles = circles;
        flight.is_circling_analysis_complete = true;
        Ok(())
    }
}

#[cfg(test)]
mod circling_test {
    use super::*;

    #[test]
    fn test_crossed_start_course_right() {
        assert!(crossed_start_course(TurnDirection::Right, 90.0, 80.0, 100.0));
        assert!(crossed_start_course(TurnDirection::Right, 90.0, 80.0, 90.0));
        assert!(!crossed_start_course(TurnDirection::Right, 90.0, 90.0, 100.0));
        assert!(!crossed_start_course(TurnDirection::Right, 90.0, 100.0, 110.0));
        // across north
        assert!(crossed_start_course(TurnDirection::Right, 5.0, 350.0, 15.0));
        // moving the wrong way never completes
        assert!(!crossed_start_course(TurnDirection::Right, 90.0, 100.0, 80.0));
    }

    #[test]
    fn test_crossed_start_course_left() {
        assert!(crossed_start_course(TurnDirection::Left, 90.0, 100.0, 80.0));
        assert!(!crossed_start_course(TurnDirection::Left, 90.0, 80.0, 70.0));
        assert!(crossed_start_course(TurnDirection::Left, 355.0, 10.0, 340.0));
        assert!(!crossed_start_course(TurnDirection::Left, 355.0, 355.0, 340.0));
    }

    /// Fixes one second apart with the given course and turn rate.
    fn scripted(samples: &[(Option<Degree>, Option<f64>)]) -> Vec<Fix> {
        let t0 = Epoch::from_gregorian_utc_hms(2017, 1, 14, 11, 0, 0);
        samples
            .iter()
            .enumerate()
            .map(|(i, &(track_course, turn_rate))| Fix {
                timestamp: t0 + hifitime::Duration::from_seconds(i as f64),
                position: GeoPoint::from_degrees(-33.1, 19.2),
                altitude: 1000.0,
                track_course,
                turn_rate,
            })
            .collect()
    }

    /// A right turn entered at fix 2 on course 10°, then 12° per second from course `from`.
    fn right_turn(from: Degree, middle: &[(Option<Degree>, Option<f64>)]) -> Vec<Fix> {
        let mut samples = vec![(None, None), (Some(0.0), None), (Some(10.0), Some(10.0))];
        samples.extend_from_slice(middle);
        samples.extend(
            (1..=40).map(|k| (Some(normalize_bearing(from + 12.0 * k as f64)), Some(12.0))),
        );
        scripted(&samples)
    }

    #[test]
    fn test_rate_at_threshold_is_not_a_reversal() {
        let fixes = right_turn(10.0, &[(Some(10.0), Some(-4.0))]);
        let circles = detect_circles(&fixes, &AnalysisParams::default()).unwrap();

        assert_eq!(circles.len(), 1);
        assert_eq!(circles[0].start_fix, 2);
        assert_eq!(circles[0].direction, TurnDirection::Right);
        assert_eq!(circles[0].end_fix, 33);

        // just above the threshold the turn restarts, twice
        let fixes = right_turn(10.0, &[(Some(10.0), Some(-4.1))]);
        let circles = detect_circles(&fixes, &AnalysisParams::default()).unwrap();
        assert_eq!(circles.len(), 1);
        assert_eq!(circles[0].start_fix, 4);
    }

    #[test]
    fn test_fix_without_rate_can_close_turn() {
        let mut fixes = right_turn(10.0, &[]);
        // course 370° is reached at fix 32; the previous fix is at 358°
        assert_eq!(fixes[32].track_course, Some(10.0));
        fixes[32].turn_rate = None;
        let circles = detect_circles(&fixes, &AnalysisParams::default()).unwrap();

        assert_eq!(circles.len(), 1);
        assert_eq!(circles[0].start_fix, 2);
        assert_eq!(circles[0].end_fix, 32);
        assert_eq!(circles[0].duration, 30);
    }

    #[test]
    fn test_stage_requires_distance() {
        let mut flight = Flight {
            id: 1,
            fixes: right_turn(10.0, &[]),
            ..Default::default()
        };
        assert!(matches!(
            CirclingAnalysis::default().run(&mut flight),
            Err(AnalysisError::PreconditionsFailed(_))
        ));
        assert!(flight.circles.is_empty());

        flight.is_distance_analysis_complete = true;
        CirclingAnalysis::default().run(&mut flight).unwrap();
        assert!(!flight.circles.is_empty());
    }

    #[test]
    fn test_direction_helpers() {
        assert_eq!(TurnDirection::Left.opposite(), TurnDirection::Right);
        assert_eq!(FlightMode::from(TurnDirection::Right), FlightMode::TurningRight);
        assert_eq!(TurnDirection::Left.sign(), -1.0);
    }

    #[test]
    fn test_turn_accessors() {
        let t0 = Epoch::from_gregorian_utc_hms(2017, 1, 14, 10, 43, 6);
        let turn = CirclingTurn {
            start_fix: 3,
            end_fix: 26,
            timestamp: t0,
            duration: 23,
            direction: TurnDirection::Left,
            start_course: 90.0,
            start_position: GeoPoint::from_degrees(50.76617, 3.877017),
            start_altitude: 1000.0,
            end_altitude: 1046.0,
            included_in_thermal: false,
            centering_correction: false,
            check_twice_rule: CheckTwiceRule::NotApplicable,
            drift: None,
            correction: None,
        };

        assert_eq!(turn.start_time_of_day(), "10:43:06");
        assert_eq!(turn.end_timestamp(), Epoch::from_gregorian_utc_hms(2017, 1, 14, 10, 43, 29));
        assert_eq!(turn.altitude_change(), 46.0);
        assert_eq!(turn.climb_rate(), 2.0);
        assert_eq!(turn.to_string(), "Duration (s) = [23]");
    }
}
