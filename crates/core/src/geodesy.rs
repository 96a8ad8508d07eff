//! Geodesic distance on the WGS84 spheroid
//!
//! The synthesis engine only needs the inverse geodetic problem: distance
//! and forward azimuth between two points. It is consumed through the
//! [`GreatCircle`] trait so callers can substitute their own geodesy.
//!
//! Reference:
//! Vincenty, T. (1975). Direct and inverse solutions of geodesics on the
//! ellipsoid with application of nested equations. Survey Review, 23(176).

/// WGS84 ellipsoid parameters
const WGS84_A: f64 = 6_378_137.0; // semi-major axis (m)
const WGS84_F: f64 = 1.0 / 298.257_223_563; // flattening

/// Inverse geodetic primitive.
pub trait GreatCircle: Send + Sync {
    /// Distance in meters and forward azimuth in degrees (clockwise from
    /// north, `[0, 360)`) from point 1 to point 2. Coordinates in degrees.
    fn inverse(&self, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> (f64, f64);

    /// Distance in meters only
    fn distance(&self, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
        self.inverse(lat1, lon1, lat2, lon2).0
    }
}

/// Vincenty inverse solution on an ellipsoid.
#[derive(Debug, Clone, Copy)]
pub struct Vincenty {
    /// Semi-major axis in meters
    pub semi_major: f64,
    /// Flattening
    pub flattening: f64,
}

impl Default for Vincenty {
    fn default() -> Self {
        Self {
            semi_major: WGS84_A,
            flattening: WGS84_F,
        }
    }
}

impl GreatCircle for Vincenty {
    fn inverse(&self, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> (f64, f64) {
        let a = self.semi_major;
        let f = self.flattening;
        let b = a * (1.0 - f);

        let u1 = ((1.0 - f) * lat1.to_radians().tan()).atan();
        let u2 = ((1.0 - f) * lat2.to_radians().tan()).atan();
        let l = (lon2 - lon1).to_radians();

        let (sin_u1, cos_u1) = u1.sin_cos();
        let (sin_u2, cos_u2) = u2.sin_cos();

        let mut lambda = l;

        for _ in 0..100 {
            let (sin_lambda, cos_lambda) = lambda.sin_cos();

            let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
                + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
            .sqrt();

            if sin_sigma < 1e-15 {
                return (0.0, 0.0); // co-incident points
            }

            let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
            let sigma = sin_sigma.atan2(cos_sigma);

            let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
            let cos2_alpha = 1.0 - sin_alpha * sin_alpha;

            // equatorial line: cos2_alpha = 0
            let cos_2sigma_m = if cos2_alpha > 1e-15 {
                cos_sigma - 2.0 * sin_u1 * sin_u2 / cos2_alpha
            } else {
                0.0
            };

            let c = f / 16.0 * cos2_alpha * (4.0 + f * (4.0 - 3.0 * cos2_alpha));
            let lambda_prev = lambda;
            lambda = l
                + (1.0 - c)
                    * f
                    * sin_alpha
                    * (sigma
                        + c * sin_sigma
                            * (cos_2sigma_m
                                + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

            if (lambda - lambda_prev).abs() < 1e-12 {
                let u_sq = cos2_alpha * (a * a - b * b) / (b * b);
                let big_a = 1.0
                    + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
                let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
                let delta_sigma = big_b
                    * sin_sigma
                    * (cos_2sigma_m
                        + big_b / 4.0
                            * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                                - big_b / 6.0
                                    * cos_2sigma_m
                                    * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                                    * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));

                let (sin_lambda, cos_lambda) = lambda.sin_cos();
                let azimuth = (cos_u2 * sin_lambda)
                    .atan2(cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda)
                    .to_degrees();

                return (b * big_a * (sigma - delta_sigma), azimuth.rem_euclid(360.0));
            }
        }

        // Failed to converge (near-antipodal): spherical approximation
        let (sin_l, cos_l) = l.sin_cos();
        let distance = a * (sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_l).clamp(-1.0, 1.0).acos();
        let azimuth = (cos_u2 * sin_l)
            .atan2(cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_l)
            .to_degrees();
        (distance, azimuth.rem_euclid(360.0))
    }
}
