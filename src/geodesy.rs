//! # Spherical geodesy kernel
//!
//! Pure functions on a **spherical Earth** of radius [`EARTH_RADIUS`]:
//!
//! - [`bearing`] – initial great-circle bearing between two points, in `[0, 360)`.
//! - [`distance`] – great-circle (haversine) distance in meters.
//! - [`destination_point`] – direct geodesic problem: where do we end up after flying a
//!   given bearing and distance from an origin.
//! - [`bearing_delta`] – signed shortest turn from one course to another, in `(-180, 180]`.
//!
//! Angles are degrees at the interface and radians inside [`GeoPoint`]. Conversion happens
//! once, when a point is built with [`GeoPoint::from_degrees`].
//!
//! ## Example
//!
//! ```rust
//! use soaring_analysis::geodesy::{bearing, destination_point, distance, GeoPoint};
//!
//! let origin = GeoPoint::from_degrees(-33.1854, 19.2057);
//! let target = destination_point(&origin, 60.0, 1_500.0);
//!
//! assert!((bearing(&origin, &target) - 60.0).abs() < 1e-9);
//! assert!((distance(&origin, &target) - 1_500.0).abs() < 1e-6);
//! ```
use crate::constants::{Degree, Meter, Radian, EARTH_RADIUS, FULL_CIRCLE};

/// A latitude/longitude pair stored in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: Radian,
    pub lon: Radian,
}

impl GeoPoint {
    /// Build a point from radians.
    pub fn new(lat: Radian, lon: Radian) -> Self {
        GeoPoint { lat, lon }
    }

    /// Build a point from decimal degrees (north and east positive).
    pub fn from_degrees(lat_deg: Degree, lon_deg: Degree) -> Self {
        GeoPoint {
            lat: lat_deg.to_radians(),
            lon: lon_deg.to_radians(),
        }
    }

    /// Latitude in decimal degrees
    pub fn lat_deg(&self) -> Degree {
        self.lat.to_degrees()
    }

    /// Longitude in decimal degrees
    pub fn lon_deg(&self) -> Degree {
        self.lon.to_degrees()
    }
}

/// Bring any angle in degrees into `[0, 360)`.
///
/// `rem_euclid` can round a tiny negative angle up to exactly `360.0`, which is folded back to 0.
pub fn normalize_bearing(angle: Degree) -> Degree {
    let b = angle.rem_euclid(FULL_CIRCLE);
    if b >= FULL_CIRCLE {
        0.0
    } else {
        b
    }
}

/// Initial great-circle bearing to fly from `p1` to `p2`.
///
/// Arguments
/// ---------
/// * `p1`: departure point
/// * `p2`: arrival point
///
/// Return
/// ------
/// * the bearing in degrees, normalized to `[0, 360)`. Coincident points give `0`.
pub fn bearing(p1: &GeoPoint, p2: &GeoPoint) -> Degree {
    let d_lon = p2.lon - p1.lon;

    let y = d_lon.sin() * p2.lat.cos();
    let x = p1.lat.cos() * p2.lat.sin() - p1.lat.sin() * p2.lat.cos() * d_lon.cos();

    normalize_bearing(y.atan2(x).to_degrees())
}

/// Great-circle distance between two points, haversine formulation.
///
/// Return
/// ------
/// * the distance in meters
pub fn distance(p1: &GeoPoint, p2: &GeoPoint) -> Meter {
    let d_lat = p2.lat - p1.lat;
    let d_lon = p2.lon - p1.lon;

    let a = (d_lat / 2.0).sin().powi(2) + p1.lat.cos() * p2.lat.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS * c
}

/// Solve the direct geodesic problem on the sphere.
///
/// Arguments
/// ---------
/// * `origin`: starting point
/// * `bearing_deg`: initial bearing in degrees
/// * `distance_m`: distance to travel in meters
///
/// Return
/// ------
/// * the point reached, with its longitude wrapped into `(-π, π]`
///
/// See also
/// --------
/// * [`bearing`] and [`distance`] – the inverse problem.
pub fn destination_point(origin: &GeoPoint, bearing_deg: Degree, distance_m: Meter) -> GeoPoint {
    let brng = bearing_deg.to_radians();
    let delta = distance_m / EARTH_RADIUS;

    let lat = (origin.lat.sin() * delta.cos() + origin.lat.cos() * delta.sin() * brng.cos()).asin();
    let lon = origin.lon
        + (brng.sin() * delta.sin() * origin.lat.cos())
            .atan2(delta.cos() - origin.lat.sin() * lat.sin());

    GeoPoint::new(lat, wrap_longitude(lon))
}

/// Longitudes already in `(-π, π]` are returned untouched.
fn wrap_longitude(lon: Radian) -> Radian {
    use std::f64::consts::PI;
    if lon > -PI && lon <= PI {
        return lon;
    }
    let wrapped = (lon + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped == -PI {
        PI
    } else {
        wrapped
    }
}

/// Signed change of course going from `course_from` to `course_to`.
///
/// Positive values are turns to the right (clockwise), negative to the left. The result
/// takes the shortest arc across the 0/360 boundary, e.g. `350 → 10` is `+20` and
/// `10 → 350` is `-20`.
///
/// Return
/// ------
/// * the turn in degrees, within `(-180, 180]`
pub fn bearing_delta(course_from: Degree, course_to: Degree) -> Degree {
    let r = (course_to - course_from).rem_euclid(FULL_CIRCLE);
    if r > 180.0 {
        r - FULL_CIRCLE
    } else {
        r
    }
}
