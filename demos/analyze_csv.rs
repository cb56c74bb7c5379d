use std::{env, io};

use camino::Utf8PathBuf;
use soaring_analysis::{
    analysis::{check_twice::CheckTwiceAnalysis, AnalysisParams},
    track_reader::read_fixes_csv,
    AnalysisError, Flight, Pipeline,
};
use tracing_subscriber::EnvFilter;

/// Analyse one CSV track and print what was found.
///
/// Usage:
///   analyze_csv <TRACK.csv> [--dip <SECONDS>]   (`--dip 0` for strict circling detection)
/// Example:
///   RUST_LOG=soaring_analysis=debug analyze_csv tests/data/single_thermal.csv --dip 4
fn main() -> Result<(), AnalysisError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut args = env::args().skip(1).collect::<Vec<_>>();
    let dip: i64 = match args.iter().position(|a| a == "--dip") {
        Some(pos) => {
            let value = args.get(pos + 1).cloned().unwrap_or_default();
            args.drain(pos..(pos + 2).min(args.len()));
            value
                .parse()
                .map_err(|_| AnalysisError::InvalidParameter(format!("--dip {value}")))?
        }
        None => AnalysisParams::default().centering_dip_tolerance_s,
    };
    let path = Utf8PathBuf::from(
        args.first()
            .cloned()
            .unwrap_or_else(|| "tests/data/single_thermal.csv".to_string()),
    );

    let params = AnalysisParams::builder()
        .centering_dip_tolerance_s(dip)
        .build()?;
    println!("{params:#}");

    let fixes = read_fixes_csv(&path)?;
    let flight = Pipeline::standard(params)
        .with_stage(Box::new(CheckTwiceAnalysis))
        .run(Flight::new(1, fixes))?;

    println!(
        "{path}: {} fixes, {:.1} km, {}",
        flight.fixes.len(),
        flight.total_track_distance / 1000.0,
        soaring_analysis::analysis::thermals::format_duration(flight.duration_s())
    );

    for (i, thermal) in flight.thermals.iter().enumerate() {
        println!(
            "thermal #{i} at {}: {thermal}, gain {:.0} m ({:.1} m/s)",
            flight.circles[thermal.circles.start].start_time_of_day(),
            thermal.altitude_gain,
            thermal.average_climb_rate()
        );
        for circle in thermal.circles_in(&flight.circles) {
            println!(
                "    {:?} {circle}, centering: {}, check twice: {:?}",
                circle.direction, circle.centering_correction, circle.check_twice_rule
            );
        }
    }

    match flight.wind_drift {
        Some(drift) => println!(
            "wind drift: {:.0} m per circle towards {:.0}° ({:?}), {} samples",
            drift.distance,
            drift.bearing,
            drift.vector().compass_point(),
            drift.samples
        ),
        None => println!("wind drift: not enough circles"),
    }

    for phase in &flight.straight_phases {
        println!("glide {phase}");
    }
    Ok(())
}
