//! Raster header summaries

use serde::{Deserialize, Serialize};

use super::{Extent, GeoTransform};

/// What the bridge needs to know about a raster without reading its cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterInfo {
    /// Layer name (file stem, or the name stored in the header)
    pub name: String,
    /// Number of bands
    pub band_count: usize,
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// Affine transformation
    pub transform: GeoTransform,
}

impl RasterInfo {
    /// Corner-based extent of the grid
    pub fn extent(&self) -> Extent {
        self.transform.extent(self.width, self.height)
    }

    /// Geometry key used to compare grids: extent, rows, columns.
    pub fn grid_geometry(&self) -> (Extent, usize, usize) {
        (self.extent(), self.height, self.width)
    }

    /// Cell size (assumes square pixels)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }
}
