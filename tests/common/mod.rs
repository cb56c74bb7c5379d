#![allow(dead_code)]

use hifitime::{Duration, Epoch};
use soaring_analysis::{fix::Fix, geodesy::destination_point};

pub const GROUND_SPEED: f64 = 25.0;

pub fn t0() -> Epoch {
    Epoch::from_gregorian_utc_hms(2017, 1, 14, 11, 0, 0)
}

/// Synthetic track: one fix per second at 25 m/s from (-33.1, 19.2), heading 10° at the
/// start. Before step k the heading changes by `increments[k]` degrees, so a constant
/// increment is a constant turn rate.
pub fn build_track(increments: &[f64]) -> Vec<Fix> {
    let mut fix = Fix::from_degrees(t0(), -33.1, 19.2, 1000.0);
    let mut heading = 10.0;
    let mut fixes = vec![fix.clone()];

    for inc in increments {
        heading += inc;
        fix = Fix {
            timestamp: fix.timestamp + Duration::from_seconds(1.0),
            position: destination_point(&fix.position, heading, GROUND_SPEED),
            ..fix
        };
        fixes.push(fix.clone());
    }
    fixes
}

/// `n` copies of `inc`.
pub fn steady(n: usize, inc: f64) -> Vec<f64> {
    vec![inc; n]
}

/// Heading increments for consecutive circles lasting `durations` seconds each.
///
/// A 12° entry step starts the turn, then each circle sweeps 3° past a full turn so that
/// the start course is crossed mid-step. `sign` is -1 for left circles.
pub fn circle_increments(durations: &[usize], sign: f64) -> Vec<f64> {
    let overshoot = 3.0;
    let mut increments = vec![sign * 12.0];
    let mut previous_overshoot = 0.0;

    for &d in durations {
        let step = (360.0 + overshoot - previous_overshoot) / d as f64;
        increments.extend(steady(d, sign * step));
        previous_overshoot = overshoot;
    }
    increments
}

/// Parse the time and position of an IGC B record, on 2017-01-14.
pub fn igc_fix(record: &str) -> Fix {
    let field = |range: std::ops::Range<usize>| record[range].parse::<f64>().unwrap();

    let (h, m, s) = (field(1..3), field(3..5), field(5..7));
    let timestamp = Epoch::from_gregorian_utc_hms(2017, 1, 14, h as u8, m as u8, s as u8);

    let mut lat = field(7..9) + field(9..14) / 60_000.0;
    if &record[14..15] == "S" {
        lat = -lat;
    }
    let mut lon = field(15..18) + field(18..23) / 60_000.0;
    if &record[23..24] == "W" {
        lon = -lon;
    }
    let altitude = field(25..30);

    Fix::from_degrees(timestamp, lat, lon, altitude)
}

/// Eight legs around a small octagon, 150 m to 280 m each.
pub const OCTAGON: [&str; 9] = [
    "B1106503311122S01912340EA0144601541",
    "B1106523311022S01912340EA0144601541",
    "B1106543310922S01912470EA0144601541",
    "B1106563310922S01912570EA0144601541",
    "B1106583311038S01912670EA0144601541",
    "B1107003311138S01912670EA0144601541",
    "B1107023311238S01912550EA0144601541",
    "B1107043311238S01912450EA0144601541",
    "B1107043311138S01912368EA0144601541",
];

/// Recorded S-turn: turns both ways but never completes a circle.
pub const S_TURN: [&str; 17] = [
    "B1109303308755S01911128EA016190171900308",
    "B1109343308702S01911090EA016310173200309",
    "B1109383308653S01911048EA016440174100308",
    "B1109423308633S01910983EA016480174500309",
    "B1109463308656S01910920EA016440174200309",
    "B1109503308709S01910895EA016450174400309",
    "B1109543308763S01910919EA016540175200309",
    "B1109583308800S01910973EA016570175800309",
    "B1110023308849S01911007EA016660176900309",
    "B1110063308901S01910995EA016840178700308",
    "B1110103308929S01910941EA016900179400309",
    "B1110143308914S01910879EA016920179500309",
    "B1110183308865S01910851EA016910179300309",
    "B1110223308810S01910877EA016860178800308",
    "B1110263308782S01910943EA016860178700307",
    "B1110303308788S01911014EA016880178900309",
    "B1110343308821S01911072EA016930179500309",
];
