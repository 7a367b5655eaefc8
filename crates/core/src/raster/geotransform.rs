//! Grid georeferencing

use serde::{Deserialize, Serialize};

use super::Extent;

/// North-up georeferencing of a grid.
///
/// `origin_x`/`origin_y` locate the outer corner of the first (top-left)
/// cell. `pixel_height` is negative for rows running south.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Build the transform of a SAGA grid.
    ///
    /// SAGA headers store the *center* of the lower-left cell, so the
    /// upper-left corner sits half a cell further out.
    pub fn from_saga_origin(xmin_center: f64, ymin_center: f64, cellsize: f64, rows: usize) -> Self {
        let half = cellsize / 2.0;
        Self::new(
            xmin_center - half,
            ymin_center - half + rows as f64 * cellsize,
            cellsize,
            -cellsize,
        )
    }

    /// Cell size along x (square cells assumed)
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Corner-based extent of a `width` x `height` grid
    pub fn extent(&self, width: usize, height: usize) -> Extent {
        let x_far = self.origin_x + width as f64 * self.pixel_width;
        let y_far = self.origin_y + height as f64 * self.pixel_height;
        Extent::new(
            self.origin_x.min(x_far),
            self.origin_y.min(y_far),
            self.origin_x.max(x_far),
            self.origin_y.max(y_far),
        )
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_north_up_extent() {
        let extent = GeoTransform::new(500.0, 2000.0, 25.0, -25.0).extent(8, 4);
        assert_relative_eq!(extent.xmin, 500.0);
        assert_relative_eq!(extent.ymin, 1900.0);
        assert_relative_eq!(extent.xmax, 700.0);
        assert_relative_eq!(extent.ymax, 2000.0);
        assert_relative_eq!(GeoTransform::default().cell_size(), 1.0);
    }

    #[test]
    fn test_saga_origin_is_cell_center() {
        // Lower-left cell centered on (15, 15) with 10 m cells, 3 rows.
        let gt = GeoTransform::from_saga_origin(15.0, 15.0, 10.0, 3);
        assert_relative_eq!(gt.origin_x, 10.0, epsilon = 1e-10);
        assert_relative_eq!(gt.origin_y, 40.0, epsilon = 1e-10);

        let extent = gt.extent(4, 3);
        assert_relative_eq!(extent.xmin, 10.0, epsilon = 1e-10);
        assert_relative_eq!(extent.ymin, 10.0, epsilon = 1e-10);
        assert_relative_eq!(extent.xmax, 50.0, epsilon = 1e-10);
        assert_relative_eq!(extent.ymax, 40.0, epsilon = 1e-10);
    }
}
