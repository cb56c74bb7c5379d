//! # Constants and type definitions for flight analysis
//!
//! This module centralizes the **physical constants**, **default analysis thresholds**, and
//! **unit type aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Spherical Earth model used by the [`geodesy`](crate::geodesy) kernel
//! - Default thresholds consumed by [`AnalysisParams`](crate::analysis::AnalysisParams)
//! - Type aliases documenting the unit carried by a bare `f64`

// -------------------------------------------------------------------------------------------------
// Physical constants
// -------------------------------------------------------------------------------------------------

/// Mean Earth radius in meters (spherical model)
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Full turn in degrees
pub const FULL_CIRCLE: f64 = 360.0;

// -------------------------------------------------------------------------------------------------
// Default analysis thresholds
// -------------------------------------------------------------------------------------------------

/// Turn rate (°/s) above which the glider is considered to be thermalling
pub const TURN_RATE_THRESHOLD: f64 = 4.0;

/// Time (s) the turn rate may stay below the threshold during a centering move before the
/// turn is abandoned
pub const CENTERING_DIP_TOLERANCE_SECONDS: i64 = 5;

/// Maximum deviation (°) of a drift bearing from the average before it is trimmed
pub const MAX_DRIFT_BEARING_DEVIATION: f64 = 5.0;

/// Maximum deviation (m) of a drift distance from the average before it is trimmed
pub const MAX_DRIFT_DISTANCE_DEVIATION: f64 = 10.0;

/// Length (s) of the sliding window used to find sharp turns in straight phases
pub const STRAIGHT_WINDOW_SECONDS: i64 = 10;

/// Course change (°) over the sliding window that counts as a sharp turn
pub const STRAIGHT_TURN_ANGLE: f64 = 45.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in meters
pub type Meter = f64;
/// Whole seconds
pub type Seconds = i64;
/// Turn rate in degrees per second
pub type DegreePerSecond = f64;
