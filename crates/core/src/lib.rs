//! # bathygrid core
//!
//! Core types for bathymetric surface synthesis.
//!
//! This crate provides:
//! - `Raster<T>`: generic georeferenced grid, and the null sentinels
//! - `GridGeometry`: output grid shape derived from a bin size and an area
//! - `Projection` / `Utm`: geodetic ↔ projected transform
//! - `GreatCircle` / `Vincenty`: inverse geodetic distance and azimuth
//! - GeoTIFF export of finished surfaces

pub mod crs;
pub mod error;
pub mod geodesy;
pub mod geometry;
pub mod io;
pub mod raster;

pub use crs::{Projection, Utm};
pub use error::{Error, Result};
pub use geodesy::{GreatCircle, Vincenty};
pub use geometry::{AreaBounds, BinSize, GridGeometry};
pub use raster::{GeoTransform, Raster, RasterElement, NULL_ELEVATION, NULL_UNCERTAINTY};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::{Projection, Utm};
    pub use crate::error::{Error, Result};
    pub use crate::geodesy::{GreatCircle, Vincenty};
    pub use crate::geometry::{AreaBounds, BinSize, GridGeometry};
    pub use crate::raster::{GeoTransform, Raster, RasterElement, NULL_ELEVATION, NULL_UNCERTAINTY};
}
