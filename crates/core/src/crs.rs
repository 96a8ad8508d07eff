//! Projection adapter: WGS84 geodetic ↔ projected grid frame
//!
//! The synthesis engine only ever sees the [`Projection`] trait. [`Utm`]
//! is the implementation shipped with the crate (Snyder 1987, USGS
//! formulas), covering zones 1–60 in both hemispheres.

use crate::error::{Error, Result};

// ── WGS84 ellipsoid constants ────────────────────────────────────────────

const A: f64 = 6_378_137.0; // semi-major axis (m)
const F: f64 = 1.0 / 298.257_223_563; // flattening
const E2: f64 = 2.0 * F - F * F; // eccentricity squared
const E_PRIME2: f64 = E2 / (1.0 - E2); // second eccentricity squared
const K0: f64 = 0.9996; // UTM scale factor
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Number of UTM zones around the globe
pub const UTM_ZONES: u8 = 60;

/// Forward/inverse coordinate transform. Must be pure.
pub trait Projection: Send + Sync {
    /// Geodetic (longitude, latitude) in degrees to projected (x, y)
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64);

    /// Projected (x, y) to geodetic (longitude, latitude) in degrees
    fn inverse(&self, x: f64, y: f64) -> (f64, f64);

    /// Short identifier used in logs and output metadata
    fn name(&self) -> String;

    /// EPSG code of the projected frame, if it has one
    fn epsg(&self) -> Option<u32> {
        None
    }
}

/// Universal Transverse Mercator on WGS84.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Utm {
    zone: u8,
    north: bool,
}

impl Utm {
    pub fn new(zone: u8, north: bool) -> Result<Self> {
        if !(1..=UTM_ZONES).contains(&zone) {
            return Err(Error::UnsupportedZone(format!("UTM zone {zone}")));
        }
        Ok(Self { zone, north })
    }

    /// Zone containing a longitude in degrees
    pub fn zone_for_longitude(lon: f64) -> Result<u8> {
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(Error::UnsupportedZone(format!("longitude {lon}")));
        }
        let zone = ((lon + 180.0) / 6.0).floor() as i64 + 1;
        Ok(zone.min(UTM_ZONES as i64) as u8)
    }

    /// Pick the zone for a geodetic area from its center.
    ///
    /// Areas spanning more longitude than the 60 zones cover are rejected.
    pub fn for_area(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self> {
        let first = Self::zone_for_longitude(min_lon)?;
        let last = Self::zone_for_longitude(max_lon)?;
        if max_lon - min_lon >= 360.0 || last < first {
            return Err(Error::UnsupportedZone(format!(
                "area spans longitudes {min_lon}..{max_lon}, more than {UTM_ZONES} zones"
            )));
        }
        let zone = Self::zone_for_longitude((min_lon + max_lon) / 2.0)?;
        Self::new(zone, (min_lat + max_lat) / 2.0 >= 0.0)
    }

    /// Parse an EPSG code into UTM zone info.
    ///
    /// - EPSG 326xx → zone xx, North hemisphere
    /// - EPSG 327xx → zone xx, South hemisphere
    pub fn from_epsg(epsg: u32) -> Result<Self> {
        match epsg {
            32601..=32660 => Self::new((epsg - 32600) as u8, true),
            32701..=32760 => Self::new((epsg - 32700) as u8, false),
            _ => Err(Error::UnsupportedZone(format!("EPSG:{epsg}"))),
        }
    }

    pub fn zone(&self) -> u8 {
        self.zone
    }

    pub fn is_north(&self) -> bool {
        self.north
    }

    pub fn epsg(&self) -> u32 {
        if self.north {
            32600 + self.zone as u32
        } else {
            32700 + self.zone as u32
        }
    }

    fn central_meridian(&self) -> f64 {
        ((self.zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
    }
}

impl Projection for Utm {
    // Snyder eq. 8-9, 8-10
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let lat = lat.to_radians();
        let lon = lon.to_radians();

        let (sin_lat, cos_lat) = lat.sin_cos();
        let tan_lat = lat.tan();

        let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
        let t = tan_lat * tan_lat;
        let c = E_PRIME2 * cos_lat * cos_lat;
        let a_coeff = cos_lat * (lon - self.central_meridian());
        let m = meridional_arc(lat);

        let a2 = a_coeff * a_coeff;
        let a4 = a2 * a2;
        let a6 = a4 * a2;

        let easting = K0
            * n
            * (a_coeff
                + (1.0 - t + c) * a2 * a_coeff / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * E_PRIME2) * a4 * a_coeff / 120.0)
            + FALSE_EASTING;

        let northing = K0
            * (m + n
                * tan_lat
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * E_PRIME2) * a6 / 720.0));

        if self.north {
            (easting, northing)
        } else {
            (easting, northing + FALSE_NORTHING_SOUTH)
        }
    }

    // Snyder eq. 8-12 .. 8-18 (footpoint latitude series)
    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let x = x - FALSE_EASTING;
        let y = if self.north { y } else { y - FALSE_NORTHING_SOUTH };

        let e4 = E2 * E2;
        let e6 = e4 * E2;
        let m = y / K0;
        let mu = m / (A * (1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

        let sqrt_1e2 = (1.0 - E2).sqrt();
        let e1 = (1.0 - sqrt_1e2) / (1.0 + sqrt_1e2);
        let e1_2 = e1 * e1;
        let e1_3 = e1_2 * e1;
        let e1_4 = e1_3 * e1;

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = phi1.tan();
        let c1 = E_PRIME2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let denom = 1.0 - E2 * sin_phi1 * sin_phi1;
        let n1 = A / denom.sqrt();
        let r1 = A * (1.0 - E2) / denom.powf(1.5);
        let d = x / (n1 * K0);

        let d2 = d * d;
        let d4 = d2 * d2;
        let d6 = d4 * d2;

        let lat = phi1
            - (n1 * tan_phi1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * E_PRIME2) * d4 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * E_PRIME2
                        - 3.0 * c1 * c1)
                        * d6
                        / 720.0);

        let lon = self.central_meridian()
            + (d - (1.0 + 2.0 * t1 + c1) * d2 * d / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * E_PRIME2 + 24.0 * t1 * t1)
                    * d4
                    * d
                    / 120.0)
                / cos_phi1;

        (lon.to_degrees(), lat.to_degrees())
    }

    fn name(&self) -> String {
        format!("UTM {}{}", self.zone, if self.north { 'N' } else { 'S' })
    }

    fn epsg(&self) -> Option<u32> {
        Some(Utm::epsg(self))
    }
}

/// Meridional arc from equator to latitude `lat` (radians).
/// Snyder eq. 3-21.
fn meridional_arc(lat: f64) -> f64 {
    let e4 = E2 * E2;
    let e6 = e4 * E2;

    A * ((1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * E2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}
