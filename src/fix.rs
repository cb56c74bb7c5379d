//! # Track points
//!
//! A [`Fix`] is one sample of the flight recorder: a UTC timestamp, a position and an
//! altitude. Two quantities are derived against the previous fix once the whole track is
//! known:
//!
//! * `track_course` – bearing flown *into* this fix from the previous one,
//! * `turn_rate` – signed change of `track_course` per second (right turns positive).
//!
//! The first fix of a track has neither, and the second has a course but no turn rate.
//! [`resolve_track`] fills both for a whole slice in one forward pass.
use hifitime::Epoch;

use crate::{
    constants::{Degree, DegreePerSecond, Meter, Seconds},
    geodesy::{bearing, bearing_delta, GeoPoint},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub timestamp: Epoch,
    pub position: GeoPoint,
    pub altitude: Meter,
    pub track_course: Option<Degree>,
    pub turn_rate: Option<DegreePerSecond>,
}

impl Fix {
    /// Create a fix from decimal degrees. Derived fields stay empty until
    /// [`resolve_track`] (or [`Fix::resolve`]) runs.
    pub fn from_degrees(timestamp: Epoch, lat_deg: Degree, lon_deg: Degree, altitude: Meter) -> Self {
        Fix {
            timestamp,
            position: GeoPoint::from_degrees(lat_deg, lon_deg),
            altitude,
            track_course: None,
            turn_rate: None,
        }
    }

    /// Elapsed time from `earlier` to `self`, rounded to whole seconds.
    pub fn seconds_since(&self, earlier: &Fix) -> Seconds {
        (self.timestamp - earlier.timestamp).to_seconds().round() as Seconds
    }

    /// Compute `track_course` and `turn_rate` against the previous fix.
    ///
    /// The turn rate is left empty when the previous fix has no course yet or when both
    /// fixes share the same timestamp.
    pub fn resolve(&mut self, previous: &Fix) {
        let course = bearing(&previous.position, &self.position);
        self.track_course = Some(course);

        let elapsed = (self.timestamp - previous.timestamp).to_seconds();
        self.turn_rate = match previous.track_course {
            Some(prev_course) if elapsed > 0.0 => Some(bearing_delta(prev_course, course) / elapsed),
            _ => None,
        };
    }
}

/// Resolve the derived fields of every fix, in sequence order.
pub fn resolve_track(fixes: &mut [Fix]) {
    for i in 1..fixes.len() {
        let (head, tail) = fixes.split_at_mut(i);
        tail[0].resolve(&head[i - 1]);
    }
}
