//! Output grid geometry
//!
//! Derives the shape of the synthesized surface (rows, columns, cell size,
//! exact bounds) from a requested bin size and an area of interest, in
//! either geodetic degrees or a projected frame.
//!
//! Row/column counts are rounded and the maximum bound is then redefined
//! as `min + count * cell`, so the grid always holds a whole number of
//! cells. This can grow (or shrink) the requested area by up to half a
//! cell on the east and north edges.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crs::{Projection, UTM_ZONES};
use crate::error::{Error, Result};
use crate::geodesy::GreatCircle;
use crate::raster::GeoTransform;

/// Slack added before rounding cell counts
const COUNT_EPSILON: f64 = 1e-7;

/// Latitude beyond which geodetic cells are widened in longitude
const POLAR_LATITUDE: f64 = 64.0;

/// An axis-aligned box, in degrees or projected units depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl AreaBounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// The four corners, counter-clockwise from (min_x, min_y)
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
        ]
    }

    /// Smallest box holding every point
    pub fn envelope(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut env = Self::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for (x, y) in points {
            env.min_x = env.min_x.min(x);
            env.min_y = env.min_y.min(y);
            env.max_x = env.max_x.max(x);
            env.max_y = env.max_y.max(y);
        }
        env
    }

    fn validate(&self) -> Result<()> {
        let finite = [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.width() <= 0.0 || self.height() <= 0.0 {
            return Err(Error::ZeroArea {
                min_x: self.min_x,
                min_y: self.min_y,
                max_x: self.max_x,
                max_y: self.max_y,
            });
        }
        Ok(())
    }
}

/// Requested bin size. Meters and arc-minutes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinSize {
    /// Ground distance in meters
    Meters(f64),
    /// Arc-minutes of latitude
    Minutes(f64),
}

impl BinSize {
    fn value(&self) -> f64 {
        match *self {
            BinSize::Meters(v) | BinSize::Minutes(v) => v,
        }
    }
}

impl Default for BinSize {
    fn default() -> Self {
        BinSize::Meters(10.0)
    }
}

/// Shape and placement of the output grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Exact grid bounds in the grid frame
    bounds: AreaBounds,
    /// Geodetic box consistent with `bounds` (identical when unprojected)
    geodetic: AreaBounds,
    cell_x: f64,
    cell_y: f64,
    rows: usize,
    cols: usize,
    projected: bool,
}

impl GridGeometry {
    /// Derive the grid for `area` (geodetic degrees) and `bin`.
    ///
    /// With a projection the grid frame is the projected one; without, it is
    /// longitude/latitude. All configuration errors surface here, before any
    /// grid buffer exists.
    pub fn new(
        area: AreaBounds,
        bin: BinSize,
        projection: Option<&dyn Projection>,
        geodesic: &dyn GreatCircle,
    ) -> Result<Self> {
        area.validate()?;
        if area.min_y < -90.0 || area.max_y > 90.0 {
            return Err(Error::InvalidParameter {
                name: "area",
                value: format!("{}..{}", area.min_y, area.max_y),
                reason: "latitude must lie within [-90, 90]".into(),
            });
        }
        let size = bin.value();
        if !size.is_finite() || size <= 0.0 {
            return Err(Error::DegenerateCellSize { dx: size, dy: size });
        }

        let geometry = match projection {
            Some(proj) => Self::projected(area, bin, proj, geodesic)?,
            None => Self::geodetic(area, bin, geodesic)?,
        };

        debug!(
            rows = geometry.rows,
            cols = geometry.cols,
            cell_x = geometry.cell_x,
            cell_y = geometry.cell_y,
            projected = geometry.projected,
            "derived grid geometry"
        );
        Ok(geometry)
    }

    fn geodetic(area: AreaBounds, bin: BinSize, geodesic: &dyn GreatCircle) -> Result<Self> {
        let (center_lon, center_lat) = area.center();

        let (cell_x, cell_y) = match bin {
            BinSize::Minutes(minutes) => {
                let cell_y = minutes / 60.0;
                let extreme = if area.max_y.abs() >= area.min_y.abs() {
                    area.max_y
                } else {
                    area.min_y
                };
                let cell_x = if extreme.abs() > POLAR_LATITUDE {
                    // Step toward the equator so the probe stays on the globe
                    let toward_equator = extreme - extreme.signum() * cell_y;
                    let ground_y = geodesic.distance(extreme, center_lon, toward_equator, center_lon);
                    let ground_x = geodesic.distance(extreme, center_lon, extreme, center_lon + cell_y);
                    cell_y * ground_y / ground_x
                } else {
                    cell_y
                };
                (cell_x, cell_y)
            }
            BinSize::Meters(meters) => {
                let probe = 1.0 / 60.0;
                let ground_y = geodesic.distance(center_lat, center_lon, center_lat + probe, center_lon);
                let ground_x = geodesic.distance(center_lat, center_lon, center_lat, center_lon + probe);
                (meters * probe / ground_x, meters * probe / ground_y)
            }
        };
        check_cell(cell_x, cell_y)?;

        let cols = Self::count_for(area.min_x, area.max_x, cell_x);
        let rows = Self::count_for(area.min_y, area.max_y, cell_y);
        let bounds = AreaBounds::new(
            area.min_x,
            area.min_y,
            area.min_x + cols as f64 * cell_x,
            area.min_y + rows as f64 * cell_y,
        );

        Ok(Self {
            bounds,
            geodetic: bounds,
            cell_x,
            cell_y,
            rows,
            cols,
            projected: false,
        })
    }

    fn projected(
        area: AreaBounds,
        bin: BinSize,
        projection: &dyn Projection,
        geodesic: &dyn GreatCircle,
    ) -> Result<Self> {
        if area.width() >= 360.0 {
            return Err(Error::UnsupportedZone(format!(
                "area {} degrees wide spans more than {UTM_ZONES} zones",
                area.width()
            )));
        }

        let cell = match bin {
            BinSize::Meters(meters) => meters,
            BinSize::Minutes(minutes) => {
                let (lon, lat) = area.center();
                geodesic.distance(lat, lon, lat + minutes / 60.0, lon)
            }
        };
        check_cell(cell, cell)?;

        // All four corners: meridian convergence skews the box
        let envelope = AreaBounds::envelope(
            area.corners()
                .iter()
                .map(|&(lon, lat)| projection.forward(lon, lat)),
        );
        envelope.validate()?;

        let cols = Self::count_for(envelope.min_x, envelope.max_x, cell);
        let rows = Self::count_for(envelope.min_y, envelope.max_y, cell);
        let bounds = AreaBounds::new(
            envelope.min_x,
            envelope.min_y,
            envelope.min_x + cols as f64 * cell,
            envelope.min_y + rows as f64 * cell,
        );
        let geodetic = AreaBounds::envelope(
            bounds
                .corners()
                .iter()
                .map(|&(x, y)| projection.inverse(x, y)),
        );

        Ok(Self {
            bounds,
            geodetic,
            cell_x: cell,
            cell_y: cell,
            rows,
            cols,
            projected: true,
        })
    }

    /// Build an unprojected geometry directly from an origin (lower-left),
    /// cell size and counts.
    pub fn from_parts(
        origin: (f64, f64),
        cell: (f64, f64),
        rows: usize,
        cols: usize,
    ) -> Result<Self> {
        check_cell(cell.0, cell.1)?;
        let bounds = AreaBounds::new(
            origin.0,
            origin.1,
            origin.0 + cols as f64 * cell.0,
            origin.1 + rows as f64 * cell.1,
        );
        Ok(Self {
            bounds,
            geodetic: bounds,
            cell_x: cell.0,
            cell_y: cell.1,
            rows,
            cols,
            projected: false,
        })
    }

    /// Same as [`GridGeometry::from_parts`] but flagged as projected, with the
    /// geodetic box re-derived through `projection`.
    pub fn from_projected_parts(
        origin: (f64, f64),
        cell: f64,
        rows: usize,
        cols: usize,
        projection: &dyn Projection,
    ) -> Result<Self> {
        let mut geometry = Self::from_parts(origin, (cell, cell), rows, cols)?;
        geometry.projected = true;
        geometry.geodetic = AreaBounds::envelope(
            geometry
                .bounds
                .corners()
                .iter()
                .map(|&(x, y)| projection.inverse(x, y)),
        );
        Ok(geometry)
    }

    /// Number of whole cells of size `cell` spanning `[min, max]`
    pub fn count_for(min: f64, max: f64, cell: f64) -> usize {
        let count = ((max - min) / cell + COUNT_EPSILON).round();
        if count.is_finite() && count > 0.0 {
            count as usize
        } else {
            0
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Cell size as (x, y) in grid-frame units
    pub fn cell_size(&self) -> (f64, f64) {
        (self.cell_x, self.cell_y)
    }

    pub fn is_projected(&self) -> bool {
        self.projected
    }

    /// Exact grid bounds in the grid frame
    pub fn bounds(&self) -> AreaBounds {
        self.bounds
    }

    /// Geodetic box covering the grid
    pub fn geodetic_bounds(&self) -> AreaBounds {
        self.geodetic
    }

    /// North-up transform with row 0 at the top edge
    pub fn transform(&self) -> GeoTransform {
        GeoTransform::new(self.bounds.min_x, self.bounds.max_y, self.cell_x, self.cell_y)
    }

    /// Center of cell (row, col) in the grid frame
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        self.transform().cell_center(row, col)
    }

    /// Footprint of cell (row, col) in the grid frame
    pub fn cell_footprint(&self, row: usize, col: usize) -> AreaBounds {
        let (min_x, min_y, max_x, max_y) = self.transform().cell_bounds(row, col);
        AreaBounds::new(min_x, min_y, max_x, max_y)
    }

    /// Cell holding a grid-frame coordinate, `None` outside the grid
    pub fn cell_of(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        self.transform().cell_index(x, y, self.rows, self.cols)
    }

    /// Nominal north-south cell size in meters
    pub fn cell_size_meters(&self, geodesic: &dyn GreatCircle) -> f64 {
        if self.projected {
            return self.cell_y;
        }
        let (lon, lat) = self.bounds.center();
        geodesic.distance(lat, lon, lat + self.cell_y, lon)
    }
}

fn check_cell(dx: f64, dy: f64) -> Result<()> {
    if dx.is_finite() && dy.is_finite() && dx > 0.0 && dy > 0.0 {
        Ok(())
    } else {
        Err(Error::DegenerateCellSize { dx, dy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::Utm;
    use crate::geodesy::Vincenty;
    use approx::assert_relative_eq;

    #[test]
    fn test_minutes_below_polar_band_are_square() {
        let area = AreaBounds::new(-70.5, 43.0, -70.0, 43.5);
        let g = GridGeometry::new(area, BinSize::Minutes(0.5), None, &Vincenty::default()).unwrap();
        let (cx, cy) = g.cell_size();
        assert_relative_eq!(cy, 0.5 / 60.0, epsilon = 1e-15);
        assert_relative_eq!(cx, cy, epsilon = 1e-15);
        assert_eq!(g.rows(), 60);
        assert_eq!(g.cols(), 60);
    }

    #[test]
    fn test_minutes_poleward_widen_longitude() {
        let area = AreaBounds::new(10.0, 70.0, 12.0, 72.0);
        let g = GridGeometry::new(area, BinSize::Minutes(1.0), None, &Vincenty::default()).unwrap();
        let (cx, cy) = g.cell_size();
        // At 72N one degree of longitude is ~0.31 of a degree of latitude
        assert!(cx > 3.0 * cy && cx < 3.5 * cy, "cx={cx}, cy={cy}");
    }

    #[test]
    fn test_meters_mode_uses_center_latitude() {
        let area = AreaBounds::new(0.0, 59.5, 1.0, 60.5);
        let g = GridGeometry::new(area, BinSize::Meters(100.0), None, &Vincenty::default()).unwrap();
        let (cx, cy) = g.cell_size();
        // Longitude cells are about twice as wide as latitude cells at 60N
        assert!((cx / cy - 2.0).abs() < 0.02, "ratio {}", cx / cy);
        let ground = Vincenty::default().distance(60.0, 0.5, 60.0 + cy, 0.5);
        assert!((ground - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_max_bound_is_exact_multiple() {
        let area = AreaBounds::new(0.0, 0.0, 0.1037, 0.0519);
        let g = GridGeometry::new(area, BinSize::Minutes(1.0), None, &Vincenty::default()).unwrap();
        let b = g.bounds();
        let (cx, cy) = g.cell_size();
        assert_eq!(g.cols(), 6);
        assert_eq!(g.rows(), 3);
        assert_relative_eq!(b.max_x, b.min_x + 6.0 * cx, epsilon = 1e-12);
        assert_relative_eq!(b.max_y, b.min_y + 3.0 * cy, epsilon = 1e-12);
    }

    #[test]
    fn test_count_roundtrip_has_no_drift() {
        let cell = (0.000_123_456_7, 0.000_098_765_4);
        for &(rows, cols) in &[(1usize, 1usize), (17, 23), (1000, 1333), (4096, 3)] {
            let g = GridGeometry::from_parts((-70.123, 43.456), cell, rows, cols).unwrap();
            let b = g.bounds();
            assert_eq!(GridGeometry::count_for(b.min_x, b.max_x, cell.0), cols);
            assert_eq!(GridGeometry::count_for(b.min_y, b.max_y, cell.1), rows);
        }
    }

    #[test]
    fn test_configuration_errors() {
        let geodesic = Vincenty::default();
        let flat = AreaBounds::new(1.0, 1.0, 1.0, 2.0);
        assert!(matches!(
            GridGeometry::new(flat, BinSize::Meters(5.0), None, &geodesic),
            Err(Error::ZeroArea { .. })
        ));

        let area = AreaBounds::new(0.0, 0.0, 1.0, 1.0);
        assert!(matches!(
            GridGeometry::new(area, BinSize::Minutes(0.0), None, &geodesic),
            Err(Error::DegenerateCellSize { .. })
        ));
        assert!(matches!(
            GridGeometry::new(area, BinSize::Meters(-1.0), None, &geodesic),
            Err(Error::DegenerateCellSize { .. })
        ));

        let world = AreaBounds::new(-180.0, 0.0, 180.0, 1.0);
        let utm = Utm::new(31, true).unwrap();
        assert!(matches!(
            GridGeometry::new(world, BinSize::Meters(5.0), Some(&utm), &geodesic),
            Err(Error::UnsupportedZone(_))
        ));
    }

    #[test]
    fn test_projected_envelope_and_geodetic_consistency() {
        let area = AreaBounds::new(-70.5, 43.0, -70.0, 43.5);
        let utm = Utm::for_area(area.min_x, area.min_y, area.max_x, area.max_y).unwrap();
        let g = GridGeometry::new(area, BinSize::Meters(50.0), Some(&utm), &Vincenty::default())
            .unwrap();
        assert!(g.is_projected());

        let b = g.bounds();
        assert_relative_eq!(b.max_x, b.min_x + g.cols() as f64 * 50.0, epsilon = 1e-6);
        assert_relative_eq!(b.max_y, b.min_y + g.rows() as f64 * 50.0, epsilon = 1e-6);

        // Every requested corner lies inside the projected grid
        for (lon, lat) in area.corners() {
            let (x, y) = utm.forward(lon, lat);
            assert!(x >= b.min_x - 1e-6 && x <= b.max_x + 25.0, "x {x} outside");
            assert!(y >= b.min_y - 1e-6 && y <= b.max_y + 25.0, "y {y} outside");
        }

        // The geodetic box covers the requested area
        let geo = g.geodetic_bounds();
        assert!(geo.min_x <= area.min_x + 1e-9 && geo.min_y <= area.min_y + 1e-9);
    }

    #[test]
    fn test_cell_lookup_matches_centers() {
        let g = GridGeometry::from_parts((0.0, 0.0), (1.0, 1.0), 10, 10).unwrap();
        let (x, y) = g.cell_center(0, 0);
        assert_relative_eq!(x, 0.5);
        assert_relative_eq!(y, 9.5);
        assert_eq!(g.cell_of(x, y), Some((0, 0)));
        assert_eq!(g.cell_of(9.99, 0.01), Some((9, 9)));
        assert_eq!(g.cell_of(10.0, 5.0), None);
        let cell = g.cell_footprint(3, 4);
        assert_relative_eq!(cell.min_x, 4.0);
        assert_relative_eq!(cell.max_y, 7.0);
    }
}
