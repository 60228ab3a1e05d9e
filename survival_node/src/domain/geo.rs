// Great-circle distance and random placement over WGS84 coordinates.

use crate::domain::state::Coordinates;
use rand::Rng;
use std::f64::consts::{PI, TAU};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters covered by one degree of latitude on the mean-radius sphere.
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * PI / 180.0;

/// Haversine distance between two fixes, in meters.
pub fn distance_m(a: Coordinates, b: Coordinates) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Uniform-area random point in the ring `[inner_m, outer_m)` around `center`.
///
/// The radius is drawn as the square root of a uniform value over the squared bounds so
/// that points do not bunch up near the center, and the longitude offset is stretched by
/// `1 / cos(lat)` because meridians converge toward the poles.
pub fn random_offset_in_ring<R: Rng + ?Sized>(
    center: Coordinates,
    inner_m: f64,
    outer_m: f64,
    rng: &mut R,
) -> Coordinates {
    let inner_sq = inner_m * inner_m;
    let outer_sq = outer_m.max(inner_m) * outer_m.max(inner_m);
    let u: f64 = rng.gen_range(0.0..1.0);
    let v: f64 = rng.gen_range(0.0..1.0);

    let r = (inner_sq + u * (outer_sq - inner_sq)).sqrt() / METERS_PER_DEGREE;
    let theta = TAU * v;

    let d_lat = r * theta.cos();
    let d_lng = r * theta.sin() / center.lat.to_radians().cos();

    Coordinates {
        lat: center.lat + d_lat,
        lng: center.lng + d_lng,
    }
}
