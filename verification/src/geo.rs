//! Geodesic distance on the WGS84 ellipsoid and the geofence check.
//!
//! Distances use Vincenty's inverse formula, falling back to the haversine
//! great-circle distance for the nearly antipodal pairs where the iteration
//! does not converge. Both are far more precise than a campus geofence needs.

use rollcall_types::Coordinate;

use crate::VerifyError;

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);

/// IUGG mean Earth radius, used by the haversine fallback.
const MEAN_RADIUS_M: f64 = 6_371_008.8;

const MAX_ITERATIONS: usize = 200;
const CONVERGENCE: f64 = 1e-12;

/// Geodesic distance between two coordinates in kilometres.
///
/// The result is exactly symmetric in its arguments.
pub fn distance_km(a: Coordinate, b: Coordinate) -> Result<f64, VerifyError> {
    a.validate()?;
    b.validate()?;
    // Fixed argument order makes distance(a, b) == distance(b, a) bit for bit.
    let (p, q) = if (a.latitude, a.longitude) <= (b.latitude, b.longitude) {
        (a, b)
    } else {
        (b, a)
    };
    let metres = vincenty_m(p, q).unwrap_or_else(|| haversine_m(p, q));
    Ok(metres / 1000.0)
}

/// Whether `sample` lies within `max_km` of `reference` (inclusive).
pub fn within_range(
    reference: Coordinate,
    sample: Coordinate,
    max_km: f64,
) -> Result<bool, VerifyError> {
    if !max_km.is_finite() || max_km < 0.0 {
        return Err(VerifyError::InvalidInput(format!(
            "radius must be a finite, non-negative number of km (got {max_km})"
        )));
    }
    Ok(distance_km(reference, sample)? <= max_km)
}

/// A fixed authorized location and radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geofence {
    pub center: Coordinate,
    pub max_km: f64,
}

impl Geofence {
    pub fn new(center: Coordinate, max_km: f64) -> Self {
        Self { center, max_km }
    }

    pub fn contains(&self, sample: Coordinate) -> Result<bool, VerifyError> {
        within_range(self.center, sample, self.max_km)
    }
}

fn vincenty_m(p: Coordinate, q: Coordinate) -> Option<f64> {
    let l = (q.longitude - p.longitude).to_radians();
    let u1 = ((1.0 - WGS84_F) * p.latitude.to_radians().tan()).atan();
    let u2 = ((1.0 - WGS84_F) * q.latitude.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            return Some(0.0);
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Both points on the equator.
        let cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };
        let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));

        if (lambda - previous).abs() < CONVERGENCE {
            let u_sq = cos_sq_alpha * (WGS84_A.powi(2) - WGS84_B.powi(2)) / WGS84_B.powi(2);
            let a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = b
                * sin_sigma
                * (cos_2sigma_m
                    + b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                            - b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma.powi(2))
                                * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));
            return Some(WGS84_B * a * (sigma - delta_sigma));
        }
    }
    None
}

fn haversine_m(p: Coordinate, q: Coordinate) -> f64 {
    let d_lat = (q.latitude - p.latitude).to_radians();
    let d_lon = (q.longitude - p.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + p.latitude.to_radians().cos() * q.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * MEAN_RADIUS_M * h.sqrt().min(1.0).asin()
}
