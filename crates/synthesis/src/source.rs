//! Read-only inputs: the sounding database and the feature store

use std::collections::HashMap;

use bathygrid_core::{AreaBounds, Error, Result};

use crate::point::{FeaturePoint, SourcePoint};

/// Sounding database queried by geodetic bounds.
///
/// Implementations may return points outside `bounds` (e.g. whole bins);
/// the engine filters by cell footprint. No ordering is required.
pub trait PointSource {
    fn points_in(&self, bounds: &AreaBounds) -> Result<Vec<SourcePoint>>;
}

/// Feature store. Returns every feature; the engine decides eligibility.
pub trait FeatureSource {
    fn features(&self) -> Result<Vec<FeaturePoint>>;
}

impl FeatureSource for [FeaturePoint] {
    fn features(&self) -> Result<Vec<FeaturePoint>> {
        Ok(self.to_vec())
    }
}

impl FeatureSource for Vec<FeaturePoint> {
    fn features(&self) -> Result<Vec<FeaturePoint>> {
        Ok(self.clone())
    }
}

/// In-memory sounding database organized in rectangular bins.
///
/// Soundings are bucketed by `floor(x / bin_x), floor(y / bin_y)`; a query
/// visits only the buckets overlapping the requested bounds.
#[derive(Debug, Clone)]
pub struct BinnedPointStore {
    bin_x: f64,
    bin_y: f64,
    bins: HashMap<(i64, i64), Vec<SourcePoint>>,
    len: usize,
}

impl BinnedPointStore {
    pub fn new(bin_x: f64, bin_y: f64) -> Result<Self> {
        if !(bin_x.is_finite() && bin_y.is_finite() && bin_x > 0.0 && bin_y > 0.0) {
            return Err(Error::InvalidParameter {
                name: "bin_size",
                value: format!("{bin_x} x {bin_y}"),
                reason: "store bins must be positive".into(),
            });
        }
        Ok(Self {
            bin_x,
            bin_y,
            bins: HashMap::new(),
            len: 0,
        })
    }

    pub fn from_points(
        points: impl IntoIterator<Item = SourcePoint>,
        bin_x: f64,
        bin_y: f64,
    ) -> Result<Self> {
        let mut store = Self::new(bin_x, bin_y)?;
        points.into_iter().for_each(|p| store.insert(p));
        Ok(store)
    }

    fn key(&self, x: f64, y: f64) -> (i64, i64) {
        ((x / self.bin_x).floor() as i64, (y / self.bin_y).floor() as i64)
    }

    /// Add a sounding. Soundings with non-finite positions are dropped.
    pub fn insert(&mut self, point: SourcePoint) {
        if !point.x.is_finite() || !point.y.is_finite() {
            return;
        }
        let key = self.key(point.x, point.y);
        self.bins.entry(key).or_default().push(point);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Extent of every stored sounding, `None` when empty
    pub fn extent(&self) -> Option<AreaBounds> {
        if self.is_empty() {
            return None;
        }
        Some(AreaBounds::envelope(
            self.bins.values().flatten().map(|p| (p.x, p.y)),
        ))
    }
}

impl PointSource for BinnedPointStore {
    fn points_in(&self, bounds: &AreaBounds) -> Result<Vec<SourcePoint>> {
        let (x0, y0) = self.key(bounds.min_x, bounds.min_y);
        let (x1, y1) = self.key(bounds.max_x, bounds.max_y);
        let inside = |p: &&SourcePoint| {
            p.x >= bounds.min_x && p.x <= bounds.max_x && p.y >= bounds.min_y && p.y <= bounds.max_y
        };

        let span = x1
            .saturating_sub(x0)
            .saturating_add(1)
            .saturating_mul(y1.saturating_sub(y0).saturating_add(1));
        if span <= 0 {
            return Ok(Vec::new());
        }

        // Large queries walk the occupied bins instead of the key range
        if span as usize > self.bins.len() {
            return Ok(self
                .bins
                .iter()
                .filter(|((bx, by), _)| (x0..=x1).contains(bx) && (y0..=y1).contains(by))
                .flat_map(|(_, pts)| pts.iter().filter(inside).copied())
                .collect());
        }

        let mut out = Vec::new();
        for by in y0..=y1 {
            for bx in x0..=x1 {
                if let Some(pts) = self.bins.get(&(bx, by)) {
                    out.extend(pts.iter().filter(inside).copied());
                }
            }
        }
        Ok(out)
    }
}
