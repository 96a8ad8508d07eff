//! GeoTIFF export of synthesized surfaces
//!
//! Uses the `tiff` crate to write a single-band 32-bit float image with the
//! minimal GeoTIFF tag set (pixel scale, tie point, GeoKey directory) plus
//! the GDAL nodata tag, so the null sentinel is honored by GIS tools.

use crate::error::Result;
use crate::raster::Raster;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

/// Options for writing GeoTIFF files
#[derive(Debug, Clone, Default)]
pub struct GeoTiffOptions {
    /// EPSG code of the projected frame; `None` writes a WGS84 geographic grid
    pub projected_epsg: Option<u32>,
}

/// Write a surface grid to a GeoTIFF file
pub fn write_geotiff<P: AsRef<Path>>(
    raster: &Raster<f32>,
    path: P,
    options: &GeoTiffOptions,
) -> Result<()> {
    let file = File::create(path.as_ref())?;
    encode_geotiff(raster, file, options)
}

/// Write a surface grid to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer(raster: &Raster<f32>, options: &GeoTiffOptions) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf), options)?;
    Ok(buf)
}

fn geo_keys(options: &GeoTiffOptions) -> Vec<u16> {
    match options.projected_epsg {
        Some(epsg) => vec![
            1, 1, 0, 3, // Version 1.1.0, 3 keys
            1024, 0, 1, 1, // GTModelTypeGeoKey = Projected
            1025, 0, 1, 1, // GTRasterTypeGeoKey = PixelIsArea
            3072, 0, 1, epsg as u16, // ProjectedCSTypeGeoKey
        ],
        None => vec![
            1, 1, 0, 3, // Version 1.1.0, 3 keys
            1024, 0, 1, 2, // GTModelTypeGeoKey = Geographic
            1025, 0, 1, 1, // GTRasterTypeGeoKey = PixelIsArea
            2048, 0, 1, 4326, // GeographicTypeGeoKey = WGS84
        ],
    }
}

fn encode_geotiff<W>(raster: &Raster<f32>, writer: W, options: &GeoTiffOptions) -> Result<()>
where
    W: std::io::Write + std::io::Seek,
{
    let mut encoder = TiffEncoder::new(writer)?;
    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster.data().iter().copied().collect();

    let mut image = encoder.new_image::<Gray32Float>(cols as u32, rows as u32)?;

    let gt = raster.transform();
    let scale = [gt.cell_width, gt.cell_height, 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])?;

    let keys = geo_keys(options);
    image
        .encoder()
        .write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), keys.as_slice())?;

    if let Some(nodata) = raster.nodata() {
        let text = format!("{nodata}");
        image
            .encoder()
            .write_tag(Tag::Unknown(GDAL_NODATA), text.as_str())?;
    }

    image.write_data(&data)?;
    Ok(())
}
