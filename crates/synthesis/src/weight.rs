//! Feature-proximity weight grid
//!
//! Each cell gets a weight in `[0, 100]` expressing how strongly it is pulled
//! toward the shoalest sounding. A cell in the same bin as a blending feature
//! scores 100. Otherwise every feature within its radius adds
//!
//! ```text
//! contribution = 100 - 10 · curve[round(100 · d / radius)]
//! curve[i]     = 10^(i/100) - (1 - i/100)
//! ```
//!
//! and the sum is rounded and clamped to 100. The curve runs from 0 at the
//! feature to ~9 at the radius, so contributions fall from 100 to ~10 before
//! cutting off.
//!
//! Weights depend only on geometry and features, never on depths, so the
//! whole grid is built up front and rows are computed independently.

use bathygrid_core::{Error, Raster, Result};
use tracing::debug;

use crate::frame::GridFrame;
use crate::maybe_rayon::*;
use crate::radius::{FeatureRole, ResolvedFeature};
use crate::sink::Progress;

/// Entries in the falloff table
pub const CURVE_LEN: usize = 100;

/// Weight of a cell holding a feature, and the clamp for summed weights
pub const FULL_WEIGHT: u8 = 100;

/// Share of overall progress taken by the weight pass
pub(crate) const PROGRESS_SHARE: usize = 20;

/// Falloff table, built per run
#[derive(Debug, Clone)]
pub struct LogCurve([f64; CURVE_LEN]);

impl Default for LogCurve {
    fn default() -> Self {
        Self::new()
    }
}

impl LogCurve {
    pub fn new() -> Self {
        let mut table = [0.0; CURVE_LEN];
        for (i, v) in table.iter_mut().enumerate() {
            let ratio = i as f64 / CURVE_LEN as f64;
            *v = 10f64.powf(ratio) - (1.0 - ratio);
        }
        Self(table)
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// Contribution of a feature at `distance / radius`; `None` at or
    /// beyond the radius
    pub fn contribution(&self, ratio: f64) -> Option<f64> {
        if !(0.0..1.0).contains(&ratio) {
            return None;
        }
        let index = (ratio * CURVE_LEN as f64).round() as usize;
        self.get(index).map(|c| 100.0 - 10.0 * c)
    }
}

/// Builds the weight grid from the blending features of a run.
pub struct WeightGridBuilder<'a> {
    frame: GridFrame<'a>,
    features: Vec<&'a ResolvedFeature>,
    curve: &'a LogCurve,
}

impl<'a> WeightGridBuilder<'a> {
    /// Only features with [`FeatureRole::Blend`] are kept, in input order.
    pub fn new(frame: GridFrame<'a>, features: &'a [ResolvedFeature], curve: &'a LogCurve) -> Self {
        let features = features
            .iter()
            .filter(|f| f.role == FeatureRole::Blend && f.radius > 0.0)
            .collect();
        Self {
            frame,
            features,
            curve,
        }
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Weight of a single cell
    pub fn cell_weight(&self, row: usize, col: usize) -> u8 {
        let center = self.frame.geometry().cell_center(row, col);
        let metric = self.frame.metric();
        let mut sum = 0.0;

        for feature in &self.features {
            if feature.cell == (row, col) {
                return FULL_WEIGHT;
            }
            let d = metric.between(center, (feature.x, feature.y));
            if d >= feature.radius {
                continue;
            }
            if let Some(c) = self.curve.contribution(d / feature.radius) {
                sum += c;
                if sum >= f64::from(FULL_WEIGHT) {
                    break;
                }
            }
        }
        sum.round().min(f64::from(FULL_WEIGHT)) as u8
    }

    fn row_weights(&self, row: usize) -> Vec<u8> {
        (0..self.frame.geometry().cols())
            .map(|col| self.cell_weight(row, col))
            .collect()
    }

    /// Compute the whole grid.
    ///
    /// Rows are processed in chunks of at most 5% of the grid; cancellation
    /// is checked before each chunk.
    pub fn build(&self, progress: &mut dyn Progress) -> Result<Raster<u8>> {
        let geometry = self.frame.geometry();
        let (rows, cols) = (geometry.rows(), geometry.cols());

        if self.features.is_empty() {
            let mut grid = Raster::new(rows, cols);
            grid.set_transform(geometry.transform());
            return Ok(grid);
        }

        let chunk = (rows / 20).max(1);
        let mut data = Vec::with_capacity(rows * cols);
        let mut start = 0;
        while start < rows {
            if progress.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let end = (start + chunk).min(rows);
            let block: Vec<Vec<u8>> = (start..end)
                .into_par_iter()
                .map(|row| self.row_weights(row))
                .collect();
            data.extend(block.into_iter().flatten());
            progress.report((end * PROGRESS_SHARE / rows) as u8);
            start = end;
        }

        let mut grid = Raster::from_vec(data, rows, cols)?;
        grid.set_transform(geometry.transform());
        debug!(
            features = self.features.len(),
            weighted = grid.data().iter().filter(|&&w| w > 0).count(),
            "weight grid built"
        );
        Ok(grid)
    }
}
