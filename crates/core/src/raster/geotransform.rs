//! Axis-aligned georeferencing for output grids

use serde::{Deserialize, Serialize};

/// Affine transform between cell indices and grid-frame coordinates.
///
/// Output surfaces are always north-up and unrotated, so the transform
/// reduces to an origin and a per-axis cell size:
/// ```text
/// x = origin_x + col * cell_width
/// y = origin_y - row * cell_height
/// ```
///
/// `origin_y` is the *top* edge of the grid; row 0 is the northernmost row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Cell size along X (always positive)
    pub cell_width: f64,
    /// Cell size along Y (always positive, rows grow southward)
    pub cell_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, cell_width: f64, cell_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            cell_width: cell_width.abs(),
            cell_height: cell_height.abs(),
        }
    }

    /// Coordinates of the center of cell (row, col)
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        let x = self.origin_x + (col as f64 + 0.5) * self.cell_width;
        let y = self.origin_y - (row as f64 + 0.5) * self.cell_height;
        (x, y)
    }

    /// Footprint of cell (row, col) as (min_x, min_y, max_x, max_y)
    pub fn cell_bounds(&self, row: usize, col: usize) -> (f64, f64, f64, f64) {
        let min_x = self.origin_x + col as f64 * self.cell_width;
        let max_y = self.origin_y - row as f64 * self.cell_height;
        (min_x, max_y - self.cell_height, min_x + self.cell_width, max_y)
    }

    /// Fractional (col, row) of a coordinate; use `.floor()` to get indices
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        if self.cell_width <= 0.0 || self.cell_height <= 0.0 {
            return (f64::NAN, f64::NAN);
        }
        (
            (x - self.origin_x) / self.cell_width,
            (self.origin_y - y) / self.cell_height,
        )
    }

    /// Cell containing (x, y) in a grid of `rows` x `cols`, if any.
    ///
    /// Footprints are half-open: a point on the shared edge of two cells
    /// belongs to the cell east of it (and south of it for rows).
    pub fn cell_index(&self, x: f64, y: f64, rows: usize, cols: usize) -> Option<(usize, usize)> {
        let (col, row) = self.geo_to_pixel(x, y);
        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }
        let (row, col) = (row.floor() as usize, col.floor() as usize);
        (row < rows && col < cols).then_some((row, col))
    }

    /// Bounding box for a grid of the given dimensions
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        (
            self.origin_x,
            self.origin_y - height as f64 * self.cell_height,
            self.origin_x + width as f64 * self.cell_width,
            self.origin_y,
        )
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}
