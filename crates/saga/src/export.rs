//! Materializing input layers in formats SAGA reads.
//!
//! Rasters become SAGA grids (`.sgrd`), exported with `io_gdal` unless they
//! already are grids or were exported earlier in the session. Vectors are
//! handed to the host, which must produce a shapefile.

use std::collections::HashMap;
use std::path::Path;

use sagabridge_core::CRS;
use tracing::{debug, info};

use crate::cache::ExportCache;
use crate::context::ProcessingContext;
use crate::descriptor::AlgorithmDescriptor;
use crate::error::{Result, SagaError};
use crate::feedback::Feedback;
use crate::naming::export_basename;
use crate::parameter::{supplied, LayerType, ParamValue, ParameterKind, Parameters};

/// Header extension of SAGA's native grid format.
pub const GRID_HEADER_EXT: &str = "sgrd";
/// Data file extension of SAGA's native grid format.
pub const GRID_DATA_EXT: &str = "sdat";
/// The only vector format handed to SAGA.
pub const VECTOR_FORMAT: &str = "shp";

/// `io_gdal` invocation converting `source` into the grid `dest`.
pub fn raster_export_command(dest: &Path, source: &str) -> String {
    format!(
        "io_gdal 0 -TRANSFORM 1 -RESAMPLING 3 -GRIDS \"{}\" -FILES \"{}\"",
        dest.display(),
        source
    )
}

/// Per-run bookkeeping: what each layer parameter was materialized as.
#[derive(Debug, Default)]
pub struct RunState {
    exported: HashMap<String, Vec<String>>,
    substitutions: Vec<(String, String)>,
    /// Commands in execution order (exports first, then the tool call).
    pub commands: Vec<String>,
    /// CRS of the first vector input that has one.
    pub crs: Option<CRS>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths a layer parameter was materialized as.
    pub fn exported(&self, param: &str) -> Option<&[String]> {
        self.exported.get(param).map(Vec::as_slice)
    }

    /// Replace every original layer reference in `raw` by its materialized path.
    pub fn substitute_sources(&self, raw: &str) -> String {
        self.substitutions
            .iter()
            .fold(raw.to_string(), |s, (source, path)| s.replace(source, path))
    }

    fn record(&mut self, param: &str, paths: Vec<String>) {
        self.exported.insert(param.to_string(), paths);
    }

    fn substitute(&mut self, source: &str, path: &str) {
        if source != path {
            self.substitutions.push((source.to_string(), path.to_string()));
        }
    }
}

/// A single layer reference held by a raster or vector parameter value.
pub(crate) fn single_layer(name: &str, value: &ParamValue) -> Result<String> {
    match value {
        ParamValue::Text(s) => Ok(s.clone()),
        ParamValue::Layers(layers) if layers.len() == 1 => Ok(layers[0].clone()),
        other => Err(SagaError::invalid_value(
            name,
            format!("expected a single layer, got {:?}", other),
        )),
    }
}

/// Exports input layers for one run, reusing the session cache.
pub struct LayerExporter<'a> {
    cache: &'a mut ExportCache,
    context: &'a dyn ProcessingContext,
}

impl<'a> LayerExporter<'a> {
    pub fn new(cache: &'a mut ExportCache, context: &'a dyn ProcessingContext) -> Self {
        Self { cache, context }
    }

    /// Materialize every supplied layer parameter of `descriptor`.
    ///
    /// Export commands are appended to `state.commands`. Exports done before a
    /// failure stay in the session cache.
    pub fn export_inputs(
        &mut self,
        descriptor: &AlgorithmDescriptor,
        parameters: &Parameters,
        state: &mut RunState,
        feedback: &mut dyn Feedback,
    ) -> Result<()> {
        for param in descriptor.inputs() {
            let Some(value) = supplied(parameters, &param.name) else {
                if param.kind.is_layer() {
                    debug!(param = %param.name, "no layer supplied, skipping");
                }
                continue;
            };
            match &param.kind {
                ParameterKind::RasterLayer => {
                    let source = single_layer(&param.name, value)?;
                    let path = self.resolve_raster(&source, state)?;
                    state.record(&param.name, vec![path]);
                }
                ParameterKind::FeatureSource => {
                    let source = single_layer(&param.name, value)?;
                    let path = self.resolve_vector(&param.name, &source, state, feedback)?;
                    state.record(&param.name, vec![path]);
                }
                ParameterKind::MultipleLayers { layer_type } => {
                    let layers = value.as_layers();
                    if layers.is_empty() {
                        continue;
                    }
                    let mut paths = Vec::with_capacity(layers.len());
                    for layer in &layers {
                        let path = match layer_type {
                            LayerType::Raster => self.resolve_raster(layer, state)?,
                            LayerType::Vector => {
                                self.resolve_vector(&param.name, layer, state, feedback)?
                            }
                        };
                        paths.push(path);
                    }
                    state.record(&param.name, paths);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Grid path for a raster source, queueing an export when needed.
    pub fn resolve_raster(&mut self, source: &str, state: &mut RunState) -> Result<String> {
        if source.ends_with(GRID_HEADER_EXT) {
            return Ok(source.to_string());
        }
        if let Some(stem) = source.strip_suffix(GRID_DATA_EXT) {
            let header = format!("{}{}", stem, GRID_HEADER_EXT);
            state.substitute(source, &header);
            return Ok(header);
        }
        if let Some(cached) = self.cache.lookup(source) {
            let cached = cached.display().to_string();
            state.substitute(source, &cached);
            return Ok(cached);
        }

        let name = self.context.layer_name(source).unwrap_or_else(|| {
            Path::new(source)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| source.to_string())
        });
        let dest = self
            .context
            .temp_filename(&format!("{}.{}", export_basename(&name), GRID_HEADER_EXT))?;

        info!(source, dest = %dest.display(), "exporting raster to SAGA grid");
        state.commands.push(raster_export_command(&dest, source));
        self.cache.store(source, &dest);

        let dest = dest.display().to_string();
        state.substitute(source, &dest);
        Ok(dest)
    }

    /// Shapefile path for a vector source; captures the run CRS on first sight.
    fn resolve_vector(
        &mut self,
        param: &str,
        source: &str,
        state: &mut RunState,
        feedback: &mut dyn Feedback,
    ) -> Result<String> {
        if state.crs.is_none() {
            state.crs = self.context.source_crs(source);
        }
        let path = self
            .context
            .compatible_vector_path(source, &[VECTOR_FORMAT], VECTOR_FORMAT, feedback)?
            .ok_or_else(|| SagaError::UnsupportedFormat {
                param: param.to_string(),
                source_id: source.to_string(),
            })?;
        state.substitute(source, &path);
        Ok(path)
    }
}
