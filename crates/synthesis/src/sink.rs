//! Outputs: where finished rows and tracking entries go, plus progress hooks

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bathygrid_core::{Error, GridGeometry, Raster, Result, NULL_ELEVATION};

use crate::point::TrackingEntry;

/// Consumer of a synthesized surface.
///
/// `emit_row` is called exactly once per row in increasing row order.
/// After the last row, the tracking pass may read back and overwrite
/// individual cells, and emits its entries in sequence order.
pub trait SurfaceSink {
    fn emit_row(&mut self, row: usize, elevation: &[f32], uncertainty: Option<&[f32]>) -> Result<()>;

    /// Current elevation of an already emitted cell
    fn read_cell(&self, row: usize, col: usize) -> Result<f32>;

    fn override_cell(&mut self, row: usize, col: usize, elevation: f32) -> Result<()>;

    fn emit_tracking_entry(&mut self, entry: &TrackingEntry) -> Result<()>;
}

/// Advisory progress reporting and cooperative cancellation.
pub trait Progress {
    fn report(&mut self, _percent: u8) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Progress hook that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Cancellation flag shared with another thread
#[derive(Debug, Default, Clone)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl Progress for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Sink that materializes the surface in memory.
#[derive(Debug, Clone)]
pub struct MemorySink {
    elevation: Raster<f32>,
    uncertainty: Option<Raster<f32>>,
    tracking: Vec<TrackingEntry>,
    next_row: usize,
}

impl MemorySink {
    pub fn new(geometry: &GridGeometry, with_uncertainty: bool) -> Self {
        let blank = || {
            let mut grid: Raster<f32> = Raster::null(geometry.rows(), geometry.cols());
            grid.set_transform(geometry.transform());
            grid
        };
        Self {
            elevation: blank(),
            uncertainty: with_uncertainty.then(blank),
            tracking: Vec::new(),
            next_row: 0,
        }
    }

    pub fn elevation(&self) -> &Raster<f32> {
        &self.elevation
    }

    pub fn uncertainty(&self) -> Option<&Raster<f32>> {
        self.uncertainty.as_ref()
    }

    pub fn tracking(&self) -> &[TrackingEntry] {
        &self.tracking
    }

    /// Number of rows received so far
    pub fn rows_emitted(&self) -> usize {
        self.next_row
    }

    pub fn into_parts(self) -> (Raster<f32>, Option<Raster<f32>>, Vec<TrackingEntry>) {
        (self.elevation, self.uncertainty, self.tracking)
    }
}

impl SurfaceSink for MemorySink {
    fn emit_row(&mut self, row: usize, elevation: &[f32], uncertainty: Option<&[f32]>) -> Result<()> {
        if row != self.next_row {
            return Err(Error::from_sink(format!(
                "row {row} emitted out of order, expected {}",
                self.next_row
            )));
        }
        self.elevation.set_row(row, elevation)?;
        if let (Some(grid), Some(values)) = (self.uncertainty.as_mut(), uncertainty) {
            grid.set_row(row, values)?;
        }
        self.next_row += 1;
        Ok(())
    }

    fn read_cell(&self, row: usize, col: usize) -> Result<f32> {
        if row >= self.next_row {
            return Ok(NULL_ELEVATION);
        }
        self.elevation.get(row, col)
    }

    fn override_cell(&mut self, row: usize, col: usize, elevation: f32) -> Result<()> {
        self.elevation.set(row, col, elevation)
    }

    fn emit_tracking_entry(&mut self, entry: &TrackingEntry) -> Result<()> {
        self.tracking.push(entry.clone());
        Ok(())
    }
}
