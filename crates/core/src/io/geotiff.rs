//! GeoTIFF header reading (without GDAL dependency)
//!
//! Uses the `tiff` crate to pull dimensions, band count and the
//! ModelTiepoint/ModelPixelScale georeferencing tags. Pixel data is never
//! decoded.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterInfo};
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use tiff::decoder::Decoder;
use tiff::tags::Tag;

/// Read GeoTIFF header metadata from a file.
///
/// The layer name is the file stem.
pub fn read_geotiff_info<P: AsRef<Path>>(path: P) -> Result<RasterInfo> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file = File::open(path)?;
    decode_info(file, name)
}

/// Read GeoTIFF header metadata from an in-memory buffer.
pub fn read_geotiff_info_from_buffer(data: &[u8], name: &str) -> Result<RasterInfo> {
    decode_info(Cursor::new(data), name.to_string())
}

fn decode_info<R>(reader: R, name: String) -> Result<RasterInfo>
where
    R: std::io::Read + std::io::Seek,
{
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Tiff(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Tiff(format!("Cannot read dimensions: {}", e)))?;

    // SamplesPerPixel defaults to 1 when the tag is absent
    let band_count = decoder.get_tag_u32(Tag::SamplesPerPixel).unwrap_or(1) as usize;

    let transform = read_geotransform(&mut decoder).unwrap_or_default();

    Ok(RasterInfo {
        name,
        band_count,
        width: width as usize,
        height: height as usize,
        transform,
    })
}

/// Attempt to read GeoTransform from TIFF tags
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<GeoTransform> {
    // ModelPixelScaleTag = 33550
    // ModelTiepointTag = 33922
    let scale = decoder
        .get_tag_f64_vec(Tag::Unknown(33550))
        .map_err(|_| Error::Other("No pixel scale tag".into()))?;

    let tiepoint = decoder
        .get_tag_f64_vec(Tag::Unknown(33922))
        .map_err(|_| Error::Other("No tiepoint tag".into()))?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
        return Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
    }

    Err(Error::Other("Cannot determine geotransform".into()))
}
