//! # SagaBridge Core
//!
//! Geospatial types and sidecar I/O shared by the SAGA bridge.
//!
//! This crate provides:
//! - `CRS`: Coordinate Reference System handling (WKT for `.prj` sidecars)
//! - `Extent`: corner-based bounding rectangles
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `RasterInfo`: grid metadata (bands, size, extent) read from headers
//! - I/O for SAGA grid headers, GeoTIFF headers and projection files

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{Extent, GeoTransform, RasterInfo};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{Extent, GeoTransform, RasterInfo};
}
