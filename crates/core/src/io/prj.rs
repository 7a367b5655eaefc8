//! Projection sidecar files (`.prj`)

use crate::crs::CRS;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Path of a sidecar file: same base name, different extension.
pub fn sidecar_path<P: AsRef<Path>>(path: P, extension: &str) -> PathBuf {
    path.as_ref().with_extension(extension)
}

/// Write the WKT of `crs` next to `data_path`.
///
/// Returns the sidecar path, or `None` when the CRS has no WKT form and
/// nothing was written.
pub fn write_prj<P: AsRef<Path>>(data_path: P, crs: &CRS) -> Result<Option<PathBuf>> {
    let Some(wkt) = crs.to_wkt() else {
        return Ok(None);
    };
    let prj = sidecar_path(data_path, "prj");
    std::fs::write(&prj, wkt)?;
    Ok(Some(prj))
}

/// Read the CRS stored in the `.prj` sidecar of `data_path`, if there is one.
pub fn read_prj<P: AsRef<Path>>(data_path: P) -> Result<Option<CRS>> {
    let prj = sidecar_path(data_path, "prj");
    if !prj.exists() {
        return Ok(None);
    }
    let wkt = std::fs::read_to_string(&prj)?;
    let wkt = wkt.trim();
    if wkt.is_empty() {
        return Ok(None);
    }
    Ok(Some(CRS::from_wkt(wkt)))
}
