//! Raster metadata: georeferencing, extents and header summaries

mod extent;
mod geotransform;
mod info;

pub use extent::Extent;
pub use geotransform::GeoTransform;
pub use info::RasterInfo;
