//! Per-cell sounding statistics

use bathygrid_core::{AreaBounds, Result};
use tracing::debug;

use crate::frame::GridFrame;
use crate::point::SourcePoint;
use crate::source::PointSource;

/// Running statistics of the soundings inside one cell
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellStats {
    pub count: u32,
    pub sum: f64,
    pub sum_sq: f64,
    /// Shoalest depth
    pub min: f64,
    pub max: f64,
    pub sum_err: f64,
    pub sum_err_sq: f64,
    /// Vertical error of the sounding that set `min`
    pub min_uncert: f64,
}

impl CellStats {
    pub fn push(&mut self, depth: f64, vertical_error: f64) {
        if self.count == 0 {
            self.min = depth;
            self.max = depth;
            self.min_uncert = vertical_error;
        } else {
            // Ties keep the error of the first sounding at that depth
            if depth < self.min {
                self.min = depth;
                self.min_uncert = vertical_error;
            }
            if depth > self.max {
                self.max = depth;
            }
        }
        self.count += 1;
        self.sum += depth;
        self.sum_sq += depth * depth;
        self.sum_err += vertical_error;
        self.sum_err_sq += vertical_error * vertical_error;
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn avg(&self) -> f64 {
        self.sum / f64::from(self.count)
    }

    /// Sample standard deviation of the depths, 0 for a single sounding
    pub fn std_dev(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        let n = f64::from(self.count);
        let avg = self.avg();
        ((self.sum_sq - n * avg * avg) / (n - 1.0)).max(0.0).sqrt()
    }

    /// Mean vertical error
    pub fn avg_tpe(&self) -> f64 {
        self.sum_err / f64::from(self.count)
    }

    /// Root-mean-square vertical error
    pub fn rms_tpe(&self) -> f64 {
        (self.sum_err_sq / f64::from(self.count)).sqrt()
    }
}

/// Gathers the soundings of one grid row at a time.
pub struct CellAggregator<'a> {
    frame: GridFrame<'a>,
    include_reference: bool,
}

impl<'a> CellAggregator<'a> {
    pub fn new(frame: GridFrame<'a>, include_reference: bool) -> Self {
        Self {
            frame,
            include_reference,
        }
    }

    /// Grid-frame footprint of a whole row
    fn row_footprint(&self, row: usize) -> AreaBounds {
        let geometry = self.frame.geometry();
        let first = geometry.cell_footprint(row, 0);
        let last = geometry.cell_footprint(row, geometry.cols().saturating_sub(1));
        AreaBounds::new(first.min_x, first.min_y, last.max_x, last.max_y)
    }

    /// Statistics for every cell of `row`.
    ///
    /// The source is queried once with the geodetic envelope of the row and
    /// each returned sounding is placed by its own cell lookup, so points
    /// the source returns outside the row are ignored.
    pub fn aggregate_row(&self, source: &dyn PointSource, row: usize) -> Result<Vec<CellStats>> {
        let cols = self.frame.geometry().cols();
        let mut stats = vec![CellStats::default(); cols];
        let query = self.frame.geodetic_envelope(&self.row_footprint(row));

        let mut skipped = 0usize;
        for point in source.points_in(&query)? {
            match self.locate(&point) {
                Some((r, c)) if r == row => stats[c].push(point.depth, point.vertical_error.max(0.0)),
                Some(_) => {}
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!(row, skipped, "soundings excluded from row");
        }
        Ok(stats)
    }

    fn locate(&self, point: &SourcePoint) -> Option<(usize, usize)> {
        if !point.is_usable(self.include_reference) {
            return None;
        }
        self.frame.cell_of(point.x, point.y)
    }
}
