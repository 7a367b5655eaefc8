//! Header and sidecar I/O for the formats the bridge inspects

mod geotiff;
mod prj;
mod sgrd;

pub use geotiff::{read_geotiff_info, read_geotiff_info_from_buffer};
pub use prj::{read_prj, sidecar_path, write_prj};
pub use sgrd::{parse_sgrd_header, read_sgrd_info};

use crate::raster::RasterInfo;
use std::path::Path;

/// Read raster metadata from any header format we understand.
///
/// `.sgrd` and `.sdat` go through the SAGA header, `.tif`/`.tiff` through the
/// TIFF tags. Anything else yields `Ok(None)`.
pub fn read_raster_info<P: AsRef<Path>>(path: P) -> crate::Result<Option<RasterInfo>> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "sgrd" => read_sgrd_info(path).map(Some),
        "sdat" => read_sgrd_info(path.with_extension("sgrd")).map(Some),
        "tif" | "tiff" => read_geotiff_info(path).map(Some),
        _ => Ok(None),
    }
}
