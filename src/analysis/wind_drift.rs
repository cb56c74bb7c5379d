//! # Wind drift estimation
//!
//! Successive circles of a thermal start roughly where the glider re-entered the core, so the
//! displacement between two circle starts approximates how far the wind carried the thermal
//! during one circle.
//!
//! ## Algorithm
//!
//! 1. **Drift samples** – for each pair of consecutive circles, the bearing and distance from
//!    the first start to the second are stored on the later circle and averaged.
//! 2. **Outlier trim** – one pass in circle order: a sample further than
//!    `max_drift_bearing_deviation` or `max_drift_distance_deviation` from the *current* mean
//!    is removed from it, and the mean is recomputed before the next sample is compared. The
//!    pass is not repeated until convergence. Samples built from an unusable position (NaN)
//!    are always removed; emptying the mean fails with
//!    [`AnalysisError::DriftSamplesExhausted`].
//! 3. **Correction vectors** – for each circle after the first, the start predicted by
//!    travelling the trimmed average drift from the previous circle's start is compared with
//!    the actual start. The bearing and distance between them isolate pilot or turbulence
//!    induced deviations from the steady drift.
//!
//! Bearings are averaged arithmetically, so drifts straddling north average poorly.
use std::cmp::Ordering::{Equal, Less};

use tracing::{debug, warn};

use crate::{
    analysis::{
        circling::CirclingTurn, require_complete, require_not_run, AnalysisParams, AnalysisStage,
    },
    analysis_errors::AnalysisError,
    constants::{Degree, Meter},
    flight::{AnalysisKind, Flight},
    geodesy::{bearing, destination_point, distance, normalize_bearing},
};

/// 16-point compass rose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompassPoint {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
}

impl CompassPoint {
    const ROSE: [CompassPoint; 16] = [
        CompassPoint::N,
        CompassPoint::NNE,
        CompassPoint::NE,
        CompassPoint::ENE,
        CompassPoint::E,
        CompassPoint::ESE,
        CompassPoint::SE,
        CompassPoint::SSE,
        CompassPoint::S,
        CompassPoint::SSW,
        CompassPoint::SW,
        CompassPoint::WSW,
        CompassPoint::W,
        CompassPoint::WNW,
        CompassPoint::NW,
        CompassPoint::NNW,
    ];

    /// Nearest compass point of a bearing in degrees.
    pub fn from_bearing(bearing: Degree) -> Self {
        let sector = (normalize_bearing(bearing) / 22.5).round() as usize % 16;
        Self::ROSE[sector]
    }
}

/// A displacement over ground: bearing (°) and distance (m).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftVector {
    pub bearing: Degree,
    pub distance: Meter,
}

impl DriftVector {
    pub fn compass_point(&self) -> CompassPoint {
        CompassPoint::from_bearing(self.bearing)
    }
}

/// Trimmed average drift per circle, with the number of samples it was averaged over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindDrift {
    pub bearing: Degree,
    pub distance: Meter,
    pub samples: usize,
}

impl WindDrift {
    pub fn vector(&self) -> DriftVector {
        DriftVector {
            bearing: self.bearing,
            distance: self.distance,
        }
    }
}

/// Everything the estimator produces, index-aligned with the input circles.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftEstimate {
    pub average: WindDrift,
    pub drifts: Vec<Option<DriftVector>>,
    pub corrections: Vec<Option<DriftVector>>,
}

/// Running arithmetic mean of drift bearings and distances.
struct DriftMean {
    bearing: Degree,
    distance: Meter,
    count: usize,
}

impl DriftMean {
    fn of(samples: &[DriftVector]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let count = samples.len();
        Some(DriftMean {
            bearing: samples.iter().map(|s| s.bearing).sum::<f64>() / count as f64,
            distance: samples.iter().map(|s| s.distance).sum::<f64>() / count as f64,
            count,
        })
    }

    /// A sample deviates unless both offsets are comparable and within bounds, so NaN
    /// samples are always trimmed.
    fn deviates(&self, sample: &DriftVector, params: &AnalysisParams) -> bool {
        let within = |offset: f64, max: f64| {
            matches!(offset.abs().partial_cmp(&max), Some(Less) | Some(Equal))
        };
        !(within(sample.bearing - self.bearing, params.max_drift_bearing_deviation)
            && within(sample.distance - self.distance, params.max_drift_distance_deviation))
    }

    /// Take `sample` out of the mean.
    fn remove(&mut self, sample: &DriftVector) -> Result<(), AnalysisError> {
        let bearing_sum = self.bearing * self.count as f64 - sample.bearing;
        let distance_sum = self.distance * self.count as f64 - sample.distance;

        self.count -= 1;
        if self.count == 0 {
            return Err(AnalysisError::DriftSamplesExhausted);
        }
        self.bearing = bearing_sum / self.count as f64;
        self.distance = distance_sum / self.count as f64;
        Ok(())
    }
}

/// Estimate the average drift between circle starts and each circle's correction vector.
///
/// Return
/// ------
/// * `Ok(None)` when there are fewer than two circles (no drift sample).
/// * `Err(AnalysisError::DriftSamplesExhausted)` if trimming removed every sample.
pub fn estimate_drift(
    circles: &[CirclingTurn],
    params: &AnalysisParams,
) -> Result<Option<DriftEstimate>, AnalysisError> {
    let mut drifts: Vec<Option<DriftVector>> = vec![None; circles.len()];
    for (i, pair) in circles.windows(2).enumerate() {
        let (p1, p2) = (&pair[0].start_position, &pair[1].start_position);
        drifts[i + 1] = Some(DriftVector {
            bearing: bearing(p1, p2),
            distance: distance(p1, p2),
        });
    }

    let samples: Vec<DriftVector> = drifts.iter().flatten().copied().collect();
    let Some(mut mean) = DriftMean::of(&samples) else {
        return Ok(None);
    };
    debug!(
        samples = mean.count,
        bearing = mean.bearing,
        distance = mean.distance,
        "raw drift mean"
    );

    for sample in &samples {
        if mean.deviates(sample, params) {
            warn!(
                bearing = sample.bearing,
                distance = sample.distance,
                "drift sample trimmed"
            );
            mean.remove(sample)?;
        }
    }

    let average = WindDrift {
        bearing: mean.bearing,
        distance: mean.distance,
        samples: mean.count,
    };

    let mut corrections: Vec<Option<DriftVector>> = vec![None; circles.len()];
    for (i, pair) in circles.windows(2).enumerate() {
        let expected = destination_point(&pair[0].start_position, average.bearing, average.distance);
        let actual = &pair[1].start_position;
        corrections[i + 1] = Some(DriftVector {
            bearing: bearing(&expected, actual),
            distance: distance(&expected, actual),
        });
    }

    Ok(Some(DriftEstimate {
        average,
        drifts,
        corrections,
    }))
}

#[derive(Debug, Clone, Default)]
pub struct WindDriftAnalysis {
    params: AnalysisParams,
}

impl WindDriftAnalysis {
    pub fn new(params: AnalysisParams) -> Self {
        WindDriftAnalysis { params }
    }
}

impl AnalysisStage for WindDriftAnalysis {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::WindDrift
    }

    fn check_preconditions(&self, flight: &Flight) -> Result<(), AnalysisError> {
        require_not_run(flight, self)?;
        require_complete(flight, AnalysisKind::Circling, self.kind())
    }

    fn perform_analysis(&self, flight: &mut Flight) -> Result<(), AnalysisError> {
        match estimate_drift(&flight.circles, &self.params)? {
            Some(estimate) => {
                debug!(
                    flight = flight.id,
                    bearing = estimate.average.bearing,
                    distance = estimate.average.distance,
                    samples = estimate.average.samples,
                    "wind drift"
                );
                for ((circle, drift), correction) in flight
                    .circles
                    .iter_mut()
                    .zip(estimate.drifts)
                    .zip(estimate.corrections)
                {
                    circle.drift = drift;
                    circle.correction = correction;
                }
                flight.wind_drift = Some(estimate.average);
            }
            None => {
                debug!(flight = flight.id, circles = flight.circles.len(), "too few circles for wind drift");
                flight.wind_drift = None;
            }
        }

        flight.is_wind_analysis_complete = true;
        Ok(())
    }
}
