//! Cell values from statistics and feature weight
//!
//! Elevations are stored positive-up, so every depth is negated. With
//! enhancement on, blending surfaces interpolate between the mean and the
//! shoalest sounding by `w = weight / 100`:
//!
//! ```text
//! elevation = -(avg · (1 - w) + min · w)
//! ```
//!
//! TPE-based uncertainties blend toward the error of the shoalest sounding
//! the same way.

use bathygrid_core::{Error, Result, NULL_ELEVATION, NULL_UNCERTAINTY};
use ndarray::ArrayView1;

use crate::aggregate::CellStats;
use crate::config::{SurfaceMode, SynthesisConfig, UncertaintyMode};

/// Finished values for one row
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceRow {
    pub elevation: Vec<f32>,
    /// Present only when an uncertainty grid was requested
    pub uncertainty: Option<Vec<f32>>,
}

/// Turns cell statistics into elevation and uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSynthesizer {
    surface: SurfaceMode,
    uncertainty: UncertaintyMode,
    enhanced: bool,
}

impl SurfaceSynthesizer {
    pub fn new(surface: SurfaceMode, uncertainty: UncertaintyMode, enhanced: bool) -> Self {
        Self {
            surface,
            uncertainty,
            enhanced,
        }
    }

    pub fn from_config(config: &SynthesisConfig) -> Self {
        Self::new(config.surface, config.uncertainty, config.enhanced)
    }

    fn blend(&self, statistic: f64, shoalest: f64, w: f64) -> f64 {
        if self.enhanced {
            statistic * (1.0 - w) + shoalest * w
        } else {
            statistic
        }
    }

    /// Elevation (positive-up) of a cell
    pub fn elevation(&self, stats: &CellStats, weight: u8) -> f32 {
        if stats.is_empty() {
            return NULL_ELEVATION;
        }
        let w = f64::from(weight.min(100)) / 100.0;
        let depth = match self.surface {
            SurfaceMode::Minimum => stats.min,
            SurfaceMode::Maximum => stats.max,
            SurfaceMode::Average | SurfaceMode::AllDepths => stats.avg(),
        };
        let depth = if self.surface.blends() {
            self.blend(depth, stats.min, w)
        } else {
            depth
        };
        (-depth) as f32
    }

    /// Uncertainty of a cell under the selected estimator
    pub fn uncertainty(&self, stats: &CellStats, weight: u8) -> f32 {
        if stats.is_empty() {
            return NULL_UNCERTAINTY;
        }
        let w = f64::from(weight.min(100)) / 100.0;
        match self.uncertainty {
            UncertaintyMode::None => NULL_UNCERTAINTY,
            UncertaintyMode::StdDev => stats.std_dev() as f32,
            UncertaintyMode::AverageTpe => self.blend(stats.avg_tpe(), stats.min_uncert, w) as f32,
            UncertaintyMode::Final => self.blend(stats.rms_tpe(), stats.min_uncert, w) as f32,
        }
    }

    /// Both values of a cell
    pub fn cell(&self, stats: &CellStats, weight: u8) -> (f32, f32) {
        (self.elevation(stats, weight), self.uncertainty(stats, weight))
    }

    /// Values for a full row; `weights` must match `stats` in length.
    pub fn row(&self, stats: &[CellStats], weights: ArrayView1<'_, u8>) -> Result<SurfaceRow> {
        if stats.len() != weights.len() {
            return Err(Error::InvalidDimensions {
                width: weights.len(),
                height: stats.len(),
            });
        }
        let elevation = stats
            .iter()
            .zip(weights.iter())
            .map(|(s, &w)| self.elevation(s, w))
            .collect();
        let uncertainty = (self.uncertainty != UncertaintyMode::None).then(|| {
            stats
                .iter()
                .zip(weights.iter())
                .map(|(s, &w)| self.uncertainty(s, w))
                .collect()
        });
        Ok(SurfaceRow {
            elevation,
            uncertainty,
        })
    }
}
