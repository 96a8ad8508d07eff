//! Grid frame: keeps every spatial comparison in one coordinate system
//!
//! Inputs arrive geodetic. When the grid is projected, positions are
//! forward-projected before any cell lookup or distance test, and cell
//! footprints are inverse-projected to query the geodetic point source.

use bathygrid_core::{AreaBounds, Error, GreatCircle, GridGeometry, Projection, Result};

/// Samples per footprint edge when inverse-projecting a box
const EDGE_SEGMENTS: usize = 32;

/// Distance in the grid's frame
#[derive(Clone, Copy)]
pub enum DistanceMetric<'a> {
    /// Euclidean distance in projected units
    Planar,
    /// Geodesic meters between (lon, lat) pairs
    Geodesic(&'a dyn GreatCircle),
}

impl DistanceMetric<'_> {
    /// Distance between two grid-frame positions
    pub fn between(&self, a: (f64, f64), b: (f64, f64)) -> f64 {
        match self {
            DistanceMetric::Planar => (a.0 - b.0).hypot(a.1 - b.1),
            DistanceMetric::Geodesic(g) => g.distance(a.1, a.0, b.1, b.0),
        }
    }
}

/// Geometry of a run bound to its projection and geodesy
#[derive(Clone, Copy)]
pub struct GridFrame<'a> {
    geometry: &'a GridGeometry,
    projection: Option<&'a dyn Projection>,
    geodesic: &'a dyn GreatCircle,
}

impl<'a> GridFrame<'a> {
    pub fn new(
        geometry: &'a GridGeometry,
        projection: Option<&'a dyn Projection>,
        geodesic: &'a dyn GreatCircle,
    ) -> Result<Self> {
        if geometry.is_projected() && projection.is_none() {
            return Err(Error::InvalidParameter {
                name: "projection",
                value: "none".into(),
                reason: "projected grid needs a projection".into(),
            });
        }
        // A geodetic grid ignores any projection it is handed
        let projection = if geometry.is_projected() { projection } else { None };
        Ok(Self {
            geometry,
            projection,
            geodesic,
        })
    }

    pub fn geometry(&self) -> &'a GridGeometry {
        self.geometry
    }

    pub fn geodesic(&self) -> &'a dyn GreatCircle {
        self.geodesic
    }

    /// Grid-frame position of a geodetic coordinate; `None` if not finite
    pub fn to_grid(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        let (x, y) = match self.projection {
            Some(p) => p.forward(lon, lat),
            None => (lon, lat),
        };
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }

    /// Cell holding a geodetic coordinate
    pub fn cell_of(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        let (x, y) = self.to_grid(lon, lat)?;
        self.geometry.cell_of(x, y)
    }

    /// Geodetic box covering grid-frame `bounds`.
    ///
    /// Projected edges are curved in lon/lat (a line of constant northing
    /// bulges poleward at the central meridian), so each edge is sampled
    /// and the box is padded by the largest sag seen between samples.
    pub fn geodetic_envelope(&self, bounds: &AreaBounds) -> AreaBounds {
        let Some(p) = self.projection else {
            return *bounds;
        };
        let corners = bounds.corners();
        let mut samples = Vec::with_capacity(4 * (2 * EDGE_SEGMENTS + 1));
        let (mut pad_x, mut pad_y) = (0.0f64, 0.0f64);
        for (i, &(ax, ay)) in corners.iter().enumerate() {
            let (bx, by) = corners[(i + 1) % corners.len()];
            let along = |t: f64| p.inverse(ax + (bx - ax) * t, ay + (by - ay) * t);
            let mut prev = along(0.0);
            samples.push(prev);
            for s in 1..=EDGE_SEGMENTS {
                let next = along(s as f64 / EDGE_SEGMENTS as f64);
                let mid = along((s as f64 - 0.5) / EDGE_SEGMENTS as f64);
                pad_x = pad_x.max((mid.0 - 0.5 * (prev.0 + next.0)).abs());
                pad_y = pad_y.max((mid.1 - 0.5 * (prev.1 + next.1)).abs());
                samples.extend([mid, next]);
                prev = next;
            }
        }
        let env = AreaBounds::envelope(samples);
        AreaBounds::new(env.min_x - pad_x, env.min_y - pad_y, env.max_x + pad_x, env.max_y + pad_y)
    }

    pub fn metric(&self) -> DistanceMetric<'a> {
        if self.projection.is_some() {
            DistanceMetric::Planar
        } else {
            DistanceMetric::Geodesic(self.geodesic)
        }
    }
}
