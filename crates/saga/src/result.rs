//! Turning a finished run into its declared outputs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use sagabridge_core::io::write_prj;
use sagabridge_core::CRS;
use tracing::{debug, warn};

use crate::command::OutputFiles;
use crate::descriptor::AlgorithmDescriptor;
use crate::error::Result;

/// Write a `.prj` next to every raster and vector output.
///
/// Nothing is written when no input CRS was captured, or when it has no WKT
/// representation.
pub fn write_sidecars(crs: Option<&CRS>, outputs: &OutputFiles) -> Result<Vec<PathBuf>> {
    let Some(crs) = crs else {
        debug!("no input CRS captured, skipping projection files");
        return Ok(Vec::new());
    };
    let mut written = Vec::new();
    for layer in &outputs.layers {
        match write_prj(layer, crs)? {
            Some(path) => written.push(path),
            None => {
                warn!(%crs, "CRS has no WKT form, projection files not written");
                break;
            }
        }
    }
    Ok(written)
}

/// Output paths keyed by output name, restricted to the declared outputs.
pub fn map_outputs(descriptor: &AlgorithmDescriptor, outputs: &OutputFiles) -> BTreeMap<String, String> {
    descriptor
        .output_names()
        .into_iter()
        .filter_map(|name| {
            outputs
                .files
                .get(name)
                .map(|path| (name.to_string(), path.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs(dir: &std::path::Path) -> OutputFiles {
        let grid = dir.join("slope.sdat").display().to_string();
        let shapes = dir.join("lines.shp").display().to_string();
        let mut files = BTreeMap::new();
        files.insert("SLOPE".to_string(), grid.clone());
        files.insert("LINES".to_string(), shapes.clone());
        files.insert("EXTRA".to_string(), "/tmp/extra.txt".to_string());
        OutputFiles {
            files,
            layers: vec![grid.clone(), shapes],
            rasters: vec![grid],
        }
    }

    #[test]
    fn test_sidecars_follow_input_crs() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_sidecars(Some(&CRS::wgs84()), &outputs(dir.path())).unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("slope.prj").exists());
        assert!(dir.path().join("lines.prj").exists());
    }

    #[test]
    fn test_no_crs_no_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_sidecars(None, &outputs(dir.path())).unwrap().is_empty());
        assert!(write_sidecars(Some(&CRS::from_epsg(32630)), &outputs(dir.path()))
            .unwrap()
            .is_empty());
        assert!(!dir.path().join("slope.prj").exists());
    }

    #[test]
    fn test_outputs_are_restricted_to_declared_names() {
        let alg = AlgorithmDescriptor::parse(
            "Channel Network\nta_channels\n\
             QgsProcessingParameterRasterDestination|SLOPE|Slope\n\
             QgsProcessingParameterVectorDestination|LINES|Lines\n",
            "t",
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mapped = map_outputs(&alg, &outputs(dir.path()));
        assert_eq!(mapped.keys().collect::<Vec<_>>(), vec!["LINES", "SLOPE"]);
    }
}
