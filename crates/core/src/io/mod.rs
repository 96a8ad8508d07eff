//! Writing finished surfaces to disk

mod geotiff;

pub use geotiff::{write_geotiff, write_geotiff_to_buffer, GeoTiffOptions};
