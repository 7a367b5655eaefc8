//! Assembling the `saga_cmd` invocation for one tool call.
//!
//! The command reads `<library> "<command name>" <hardcoded tokens>` followed
//! by one `-NAME value` pair per supplied input and one `-NAME "path"` pair
//! per output.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::context::ProcessingContext;
use crate::descriptor::AlgorithmDescriptor;
use crate::error::{Result, SagaError};
use crate::export::{RunState, GRID_HEADER_EXT};
use crate::parameter::{supplied, ParamValue, ParameterDescriptor, ParameterKind, Parameters};

/// Parameter holding the output cell size of gridding tools.
pub const CELL_SIZE_PARAM: &str = "USER_SIZE";
/// Tool whose raster outputs are also written as RGB images.
pub const RGB_COMPOSITE: &str = "RGB Composite";

/// Output files of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputFiles {
    /// Output path for each destination parameter.
    pub files: BTreeMap<String, String>,
    /// Raster and vector outputs, in declaration order.
    pub layers: Vec<String>,
    /// Raster outputs only.
    pub rasters: Vec<String>,
}

/// The tool invocation and the outputs it will produce.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltCommand {
    pub command: String,
    pub outputs: OutputFiles,
}

/// Renders the tool invocation from the parameter values of a run.
pub struct CommandBuilder<'a> {
    descriptor: &'a AlgorithmDescriptor,
    context: &'a dyn ProcessingContext,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(descriptor: &'a AlgorithmDescriptor, context: &'a dyn ProcessingContext) -> Self {
        Self {
            descriptor,
            context,
        }
    }

    /// `<library> "<command name>" <hardcoded>` with a trailing space.
    pub fn base_command(&self) -> String {
        let d = self.descriptor;
        format!("{} \"{}\" {}", d.library, d.command_name, d.hardcoded.join(" "))
    }

    /// Build the command. Layer inputs must already be exported into `state`.
    pub fn build(&self, parameters: &Parameters, state: &RunState) -> Result<BuiltCommand> {
        let mut command = self.base_command();

        for param in self.descriptor.inputs() {
            let Some(value) = supplied(parameters, &param.name) else {
                continue;
            };
            if let Some(tokens) = self.input_tokens(param, value, parameters, state)? {
                command.push_str(&tokens);
            }
        }

        let mut outputs = OutputFiles::default();
        for param in self.descriptor.destinations() {
            let path = self.output_path(param, parameters)?;
            command.push_str(&format!(" -{} \"{}\"", param.name, path));
            match param.kind {
                ParameterKind::RasterDestination => {
                    outputs.rasters.push(path.clone());
                    outputs.layers.push(path.clone());
                }
                ParameterKind::VectorDestination => outputs.layers.push(path.clone()),
                _ => {}
            }
            outputs.files.insert(param.name.clone(), path);
        }

        debug!(algorithm = %self.descriptor.id, %command, "built command");
        Ok(BuiltCommand { command, outputs })
    }

    /// Cell size from the `USER_SIZE` parameter, 0 when absent.
    pub fn guess_cell_size(&self, parameters: &Parameters) -> f64 {
        self.descriptor
            .parameter(CELL_SIZE_PARAM)
            .and_then(|p| supplied(parameters, &p.name))
            .and_then(ParamValue::as_f64)
            .unwrap_or(0.0)
    }

    fn input_tokens(
        &self,
        param: &ParameterDescriptor,
        value: &ParamValue,
        parameters: &Parameters,
        state: &RunState,
    ) -> Result<Option<String>> {
        let name = &param.name;
        let tokens = match &param.kind {
            ParameterKind::RasterLayer | ParameterKind::FeatureSource => {
                let path = state
                    .exported(name)
                    .and_then(|paths| paths.first())
                    .ok_or_else(|| SagaError::MissingExport(name.clone()))?;
                format!(" -{} \"{}\"", name, path)
            }
            ParameterKind::MultipleLayers { .. } => {
                if value.as_layers().is_empty() {
                    return Ok(None);
                }
                let paths = state
                    .exported(name)
                    .ok_or_else(|| SagaError::MissingExport(name.clone()))?;
                // saga_cmd has always been handed the exported paths as the flag token.
                format!(
                    " -{} \"{}\"",
                    paths.join(";"),
                    state.substitute_sources(&value.raw_text())
                )
            }
            ParameterKind::Boolean => {
                let flag = value
                    .as_bool()
                    .ok_or_else(|| SagaError::invalid_value(name, "not a boolean"))?;
                format!(" -{} {}", name.trim(), flag)
            }
            ParameterKind::Matrix { headers } => {
                let cells = value.as_matrix();
                if cells.len() % 3 != 0 {
                    return Err(SagaError::invalid_value(
                        name,
                        format!("{} values do not fill rows of 3", cells.len()),
                    ));
                }
                let path = self
                    .context
                    .temp_filename(&format!("{}.txt", name.to_lowercase()))?;
                write_matrix_table(&path, headers, &cells)?;
                format!(" -{} \"{}\"", name, path.display())
            }
            ParameterKind::Extent => {
                let extent = value
                    .as_extent()
                    .ok_or_else(|| SagaError::invalid_value(name, "not an extent"))?;
                let names = self
                    .descriptor
                    .extent_names
                    .as_ref()
                    .ok_or_else(|| SagaError::MissingExtentAliases(self.descriptor.id.clone()))?;
                // SAGA expects cell centres, not corners.
                let half = self.guess_cell_size(parameters) / 2.0;
                let values = [
                    extent.xmin + half,
                    extent.ymin - half,
                    extent.xmax + half,
                    extent.ymax - half,
                ];
                names
                    .iter()
                    .zip(values)
                    .map(|(alias, v)| format!(" -{} {}", alias, format_number(v)))
                    .collect::<String>()
            }
            ParameterKind::Number { .. } => {
                let v = value
                    .as_f64()
                    .ok_or_else(|| SagaError::invalid_value(name, "not a number"))?;
                format!(" -{} {}", name, format_number(v))
            }
            ParameterKind::Enum { .. } => {
                let index = value
                    .as_enum_index()
                    .ok_or_else(|| SagaError::invalid_value(name, "not an option index"))?;
                format!(" -{} {}", name, index)
            }
            ParameterKind::String | ParameterKind::File | ParameterKind::Field { .. } => {
                format!(" -{} \"{}\"", name, value.raw_text())
            }
            ParameterKind::RasterDestination
            | ParameterKind::VectorDestination
            | ParameterKind::FileDestination { .. } => return Ok(None),
        };
        Ok(Some(tokens))
    }

    fn output_path(&self, param: &ParameterDescriptor, parameters: &Parameters) -> Result<String> {
        if let Some(path) = supplied(parameters, &param.name)
            .and_then(ParamValue::as_text)
            .filter(|p| !p.trim().is_empty())
        {
            return Ok(path.trim().to_string());
        }
        let ext = param.kind.output_extension().unwrap_or("txt");
        let path = self
            .context
            .temp_filename(&format!("{}.{}", param.name, ext))?;
        Ok(path.display().to_string())
    }
}

/// Extra commands writing every raster output of `RGB Composite` as an image.
pub fn image_grid_commands(descriptor: &AlgorithmDescriptor, outputs: &OutputFiles) -> Vec<String> {
    if descriptor.command_name != RGB_COMPOSITE {
        return Vec::new();
    }
    outputs
        .rasters
        .iter()
        .map(|path| {
            format!(
                "io_grid_image 0 -IS_RGB -GRID:\"{}.{}\" -FILE:\"{}\"",
                path, GRID_HEADER_EXT, path
            )
        })
        .collect()
}

/// Numbers as SAGA reads them: integral values keep a `.0`.
pub fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

/// Write a lookup table: tab-separated headers, then one row per 3 values.
pub fn write_matrix_table(path: &Path, headers: &[String], cells: &[String]) -> Result<()> {
    let mut table = headers.join("\t");
    table.push('\n');
    for row in cells.chunks(3) {
        table.push_str(&row.join("\t"));
        table.push('\n');
    }
    std::fs::write(path, table)?;
    Ok(())
}
