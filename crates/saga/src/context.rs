//! The host side of a run: layer lookup, CRS, vector conversion, temp files.
//!
//! `ProcessingContext` is the seam to whatever application owns the layers.
//! `LocalContext` is the filesystem-only implementation used by the CLI.

use std::path::{Path, PathBuf};

use sagabridge_core::io::{read_prj, read_raster_info};
use sagabridge_core::{RasterInfo, CRS};
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::feedback::Feedback;

/// Services the bridge needs from the host application.
pub trait ProcessingContext {
    /// Header metadata of a raster layer, `None` if it cannot be resolved.
    fn raster_info(&self, source: &str) -> Option<RasterInfo>;

    /// Display name of a layer, `None` if the reference is not a known layer.
    fn layer_name(&self, source: &str) -> Option<String>;

    /// CRS of a vector source, if known.
    fn source_crs(&self, source: &str) -> Option<CRS>;

    /// Path to the vector source in one of `formats`, converting it to
    /// `preferred` if the host can. `Ok(None)` means no compatible path exists.
    fn compatible_vector_path(
        &self,
        source: &str,
        formats: &[&str],
        preferred: &str,
        feedback: &mut dyn Feedback,
    ) -> Result<Option<String>>;

    /// A fresh, unique path ending in `basename`. The parent folder exists.
    fn temp_filename(&self, basename: &str) -> Result<PathBuf>;
}

/// Filesystem context: layer references are plain file paths.
#[derive(Debug, Clone)]
pub struct LocalContext {
    temp_root: PathBuf,
}

impl LocalContext {
    /// Temporary files go into unique subfolders of `temp_root`.
    pub fn new(temp_root: impl Into<PathBuf>) -> Self {
        Self {
            temp_root: temp_root.into(),
        }
    }

    /// Context using `<system temp>/sagabridge` for temporary files.
    pub fn in_system_temp() -> Self {
        Self::new(std::env::temp_dir().join("sagabridge"))
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }
}

fn extension_of(source: &str) -> String {
    Path::new(source)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

impl ProcessingContext for LocalContext {
    fn raster_info(&self, source: &str) -> Option<RasterInfo> {
        match read_raster_info(source) {
            Ok(info) => info,
            Err(e) => {
                debug!(source, error = %e, "cannot read raster header");
                None
            }
        }
    }

    fn layer_name(&self, source: &str) -> Option<String> {
        let path = Path::new(source);
        if !path.exists() {
            return None;
        }
        path.file_stem().map(|s| s.to_string_lossy().into_owned())
    }

    fn source_crs(&self, source: &str) -> Option<CRS> {
        read_prj(source).ok().flatten()
    }

    fn compatible_vector_path(
        &self,
        source: &str,
        formats: &[&str],
        _preferred: &str,
        _feedback: &mut dyn Feedback,
    ) -> Result<Option<String>> {
        // No conversion without a host: the file must already be in a compatible format.
        let ext = extension_of(source);
        if formats.iter().any(|f| f.eq_ignore_ascii_case(&ext)) {
            Ok(Some(source.to_string()))
        } else {
            Ok(None)
        }
    }

    fn temp_filename(&self, basename: &str) -> Result<PathBuf> {
        let dir = self.temp_root.join(Uuid::new_v4().simple().to_string());
        std::fs::create_dir_all(&dir)?;
        Ok(dir.join(basename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::LogFeedback;

    #[test]
    fn test_temp_filenames_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = LocalContext::new(dir.path());
        let a = ctx.temp_filename("dem.sgrd").unwrap();
        let b = ctx.temp_filename("dem.sgrd").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.file_name().unwrap(), "dem.sgrd");
        assert!(a.parent().unwrap().is_dir());
        assert!(a.starts_with(dir.path()));
    }

    #[test]
    fn test_vector_compatibility_by_extension() {
        let ctx = LocalContext::in_system_temp();
        let mut feedback = LogFeedback::new();
        assert_eq!(
            ctx.compatible_vector_path("/data/roads.SHP", &["shp"], "shp", &mut feedback)
                .unwrap(),
            Some("/data/roads.SHP".to_string())
        );
        assert_eq!(
            ctx.compatible_vector_path("/data/roads.gpkg", &["shp"], "shp", &mut feedback)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_layer_lookup_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let header = dir.path().join("dem.sgrd");
        std::fs::write(
            &header,
            "POSITION_XMIN = 5\nPOSITION_YMIN = 5\nCELLCOUNT_X = 3\nCELLCOUNT_Y = 2\nCELLSIZE = 10\n",
        )
        .unwrap();
        let source = header.to_string_lossy().into_owned();

        let ctx = LocalContext::new(dir.path());
        assert_eq!(ctx.layer_name(&source).as_deref(), Some("dem"));
        let info = ctx.raster_info(&source).unwrap();
        assert_eq!((info.width, info.height), (3, 2));

        assert!(ctx.layer_name("/no/such/file.tif").is_none());
        assert!(ctx.raster_info("/no/such/file.tif").is_none());
        assert!(ctx.source_crs(&source).is_none());
    }
}
