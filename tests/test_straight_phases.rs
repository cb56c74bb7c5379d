mod common;

use approx::assert_relative_eq;
use common::{build_track, circle_increments, steady, GROUND_SPEED};
use soaring_analysis::{analysis::AnalysisParams, analyze, analyze_with, Flight};

fn bounds(flight: &Flight) -> Vec<(usize, usize)> {
    flight
        .straight_phases
        .iter()
        .map(|p| (p.start_fix, p.end_fix))
        .collect()
}

#[test]
fn test_sharp_turn_mid_glide_splits() {
    let increments = [steady(60, 0.0), steady(12, 7.5), steady(60, 0.0)].concat();
    let flight = analyze(build_track(&increments)).unwrap();

    assert!(flight.circles.is_empty());
    assert_eq!(bounds(&flight), vec![(0, 66), (66, 132)]);

    for phase in &flight.straight_phases {
        assert_eq!(phase.duration, 66);
        assert!(phase.ground_speed > 0.0 && phase.ground_speed <= GROUND_SPEED);
    }
}

#[test]
fn test_short_lead_in_does_not_split() {
    let increments = [steady(3, 0.0), steady(12, 7.5), steady(60, 0.0)].concat();
    let flight = analyze(build_track(&increments)).unwrap();

    assert_eq!(bounds(&flight), vec![(0, 75)]);
}

#[test]
fn test_turn_back_splits_again() {
    let increments = [
        steady(60, 0.0),
        steady(12, 7.5),
        steady(60, 0.0),
        steady(12, -7.5),
        steady(60, 0.0),
    ]
    .concat();
    let flight = analyze(build_track(&increments)).unwrap();

    assert_eq!(bounds(&flight), vec![(0, 66), (66, 139), (139, 204)]);
}

#[test]
fn test_phases_around_thermal() {
    let increments = [
        steady(40, 0.0),
        circle_increments(&[30, 30], 1.0),
        steady(40, 0.0),
    ]
    .concat();
    let flight = analyze(build_track(&increments)).unwrap();

    assert_eq!(flight.thermals.len(), 1);
    assert_eq!(bounds(&flight), vec![(0, 41), (101, 141)]);

    let before = &flight.straight_phases[0];
    assert_relative_eq!(before.distance, 41.0 * GROUND_SPEED, max_relative = 1e-3);
    assert_relative_eq!(before.ground_speed, GROUND_SPEED, max_relative = 1e-3);
}

#[test]
fn test_wider_angle_keeps_glide_whole() {
    let increments = [steady(60, 0.0), steady(12, 7.5), steady(60, 0.0)].concat();
    let params = AnalysisParams::builder()
        .straight_turn_angle(100.0)
        .build()
        .unwrap();
    let flight = analyze_with(build_track(&increments), params).unwrap();

    assert_eq!(bounds(&flight), vec![(0, 132)]);
}
