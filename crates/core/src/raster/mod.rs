//! Grid data structures

mod element;
mod geotransform;
mod grid;

pub use element::{RasterElement, NULL_ELEVATION, NULL_UNCERTAINTY};
pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
