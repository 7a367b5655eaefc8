//! SAGA grid header (`.sgrd`) parsing
//!
//! A header is a list of `KEY = VALUE` lines. Only the geometry keys are
//! required; SAGA grids always hold a single band.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterInfo};
use std::collections::HashMap;
use std::path::Path;

/// Read a `.sgrd` header file into raster metadata.
pub fn read_sgrd_info<P: AsRef<Path>>(path: P) -> Result<RasterInfo> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_sgrd_header(&text, &stem).map_err(|reason| Error::InvalidHeader {
        path: path.display().to_string(),
        reason,
    })
}

/// Parse header text. `fallback_name` is used when the header has no `NAME`.
pub fn parse_sgrd_header(text: &str, fallback_name: &str) -> std::result::Result<RasterInfo, String> {
    let fields: HashMap<String, String> = text
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            Some((key.trim().to_ascii_uppercase(), value.trim().to_string()))
        })
        .collect();

    let number = |key: &str| -> std::result::Result<f64, String> {
        let raw = fields.get(key).ok_or_else(|| format!("missing {}", key))?;
        raw.parse::<f64>()
            .map_err(|_| format!("{} is not a number: {}", key, raw))
    };
    let count = |key: &str| -> std::result::Result<usize, String> {
        let raw = fields.get(key).ok_or_else(|| format!("missing {}", key))?;
        raw.parse::<usize>()
            .map_err(|_| format!("{} is not a cell count: {}", key, raw))
    };

    let width = count("CELLCOUNT_X")?;
    let height = count("CELLCOUNT_Y")?;
    let cellsize = number("CELLSIZE")?;
    let xmin = number("POSITION_XMIN")?;
    let ymin = number("POSITION_YMIN")?;

    if cellsize <= 0.0 {
        return Err(format!("CELLSIZE must be positive, got {}", cellsize));
    }

    let name = fields
        .get("NAME")
        .filter(|n| !n.is_empty())
        .cloned()
        .unwrap_or_else(|| fallback_name.to_string());

    Ok(RasterInfo {
        name,
        band_count: 1,
        width,
        height,
        transform: GeoTransform::from_saga_origin(xmin, ymin, cellsize, height),
    })
}
