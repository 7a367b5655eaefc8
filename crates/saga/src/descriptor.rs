//! Algorithm descriptors and the declaration file format.
//!
//! A declaration file looks like:
//!
//! ```text
//! Slope, Aspect, Curvature|Slope, Aspect, Curvature
//! ta_morphometry
//! QgsProcessingParameterRasterLayer|ELEVATION|Elevation|None|False
//! QgsProcessingParameterEnum|METHOD|Method|[0] maximum slope;[1] 6 parameter 2nd order polynom|False|1
//! QgsProcessingParameterRasterDestination|SLOPE|Slope
//! Hardcoded|-UNIT_SLOPE 0
//! AllowUnmatching
//! Extent XMIN YMIN XMAX YMAX
//! ```
//!
//! Line 1 is the algorithm name, optionally `display name|saga command name`.
//! Line 2 is the SAGA tool library. Directives follow, one per line, up to
//! the first blank line.

use std::path::Path;

use tracing::debug;

use crate::error::{Result, SagaError};
use crate::naming::{algorithm_id, decorated_algorithm_name, decorated_group_name};
use crate::parameter::{LayerType, ParameterDescriptor, ParameterKind, Parameters};

/// Name of the extent parameter created by an `Extent` directive.
pub const OUTPUT_EXTENT: &str = "OUTPUT_EXTENT";

/// Everything the bridge knows about one SAGA tool. Immutable after load.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmDescriptor {
    /// Lower-case sanitized id, used to key hooks.
    pub id: String,
    pub display_name: String,
    /// Name of the tool as `saga_cmd` knows it.
    pub command_name: String,
    /// Group shown to users.
    pub group: String,
    /// SAGA tool library, used verbatim on the command line.
    pub library: String,
    pub parameters: Vec<ParameterDescriptor>,
    /// Literal tokens appended after the command name.
    pub hardcoded: Vec<String>,
    pub allow_nonmatching_grid_extents: bool,
    /// SAGA parameter names receiving xmin, ymin, xmax, ymax.
    pub extent_names: Option<[String; 4]>,
}

impl AlgorithmDescriptor {
    /// Load a declaration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, &path.display().to_string())
    }

    /// Parse declaration text. `origin` names the source in error messages.
    pub fn parse(text: &str, origin: &str) -> Result<Self> {
        let fail = |reason: String| SagaError::Declaration {
            file: origin.to_string(),
            reason,
        };

        let mut lines = text.lines().map(str::trim);

        let first = lines
            .next()
            .filter(|l| !l.is_empty())
            .ok_or_else(|| fail("missing algorithm name".into()))?;
        let (name, command_name) = match first.split_once('|') {
            Some((name, cmd)) => (name.trim(), cmd.trim()),
            None => (first, first),
        };
        let display_name = decorated_algorithm_name(name);
        let id = algorithm_id(&display_name);

        let library = lines
            .next()
            .filter(|l| !l.is_empty())
            .ok_or_else(|| fail("missing tool library".into()))?
            .to_string();

        let mut descriptor = AlgorithmDescriptor {
            id,
            display_name,
            command_name: command_name.to_string(),
            group: decorated_group_name(&library),
            library,
            parameters: Vec::new(),
            hardcoded: Vec::new(),
            allow_nonmatching_grid_extents: false,
            extent_names: None,
        };

        for line in lines.take_while(|l| !l.is_empty()) {
            if let Some(token) = line.strip_prefix("Hardcoded|") {
                descriptor.hardcoded.push(token.to_string());
            } else if line.starts_with("QgsProcessingParameter") || line.starts_with("Parameter") {
                let param = parse_parameter_line(line).map_err(fail)?;
                descriptor.parameters.push(param);
            } else if line.starts_with("AllowUnmatching") {
                descriptor.allow_nonmatching_grid_extents = true;
            } else if let Some(rest) = line.strip_prefix("Extent") {
                let names: Vec<String> = rest.split_whitespace().map(String::from).collect();
                let names: [String; 4] = names
                    .try_into()
                    .map_err(|n: Vec<String>| fail(format!("Extent needs 4 names, got {}", n.len())))?;
                descriptor.extent_names = Some(names);
                descriptor.parameters.push(ParameterDescriptor::new(
                    OUTPUT_EXTENT,
                    "Output extent",
                    ParameterKind::Extent,
                ));
            } else {
                debug!(origin, line, "ignoring unknown declaration line");
            }
        }

        Ok(descriptor)
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Input parameters, in declaration order.
    pub fn inputs(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters.iter().filter(|p| !p.is_destination())
    }

    /// Destination parameters, in declaration order.
    pub fn destinations(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters.iter().filter(|p| p.is_destination())
    }

    /// Names of the declared outputs (one per destination parameter).
    pub fn output_names(&self) -> Vec<&str> {
        self.destinations().map(|p| p.name.as_str()).collect()
    }

    /// Fill in declared defaults for inputs the caller left out entirely.
    ///
    /// Explicit `Null` values are kept: they mean "unset on purpose".
    pub fn apply_defaults(&self, parameters: &mut Parameters) -> Result<()> {
        for param in self.inputs() {
            if parameters.contains_key(&param.name) {
                continue;
            }
            if let Some(default) = &param.default {
                let value = param.parse_value(default)?;
                parameters.insert(param.name.clone(), value);
            }
        }
        Ok(())
    }

    /// Key used to look up algorithm hooks.
    pub fn hook_key(&self) -> String {
        self.id.replace('.', "_")
    }
}

/// Parse one `QgsProcessingParameter<Kind>|NAME|Description|...` line.
fn parse_parameter_line(line: &str) -> std::result::Result<ParameterDescriptor, String> {
    let tokens: Vec<&str> = line.split('|').map(str::trim).collect();
    let type_token = tokens[0];
    let kind_name = type_token
        .strip_prefix("QgsProcessingParameter")
        .or_else(|| type_token.strip_prefix("Parameter"))
        .unwrap_or(type_token);

    let name = tokens
        .get(1)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| format!("parameter without a name: {}", line))?
        .to_string();
    let description = tokens.get(2).copied().unwrap_or(name.as_str()).to_string();
    let extra = tokens.get(3..).unwrap_or(&[]);
    let flag = |idx: usize| {
        extra
            .get(idx)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
    let field = |idx: usize| {
        extra
            .get(idx)
            .filter(|v| !v.is_empty() && *v != &"None")
            .map(|v| v.to_string())
    };

    // (kind, index of the optional flag, index of the default value)
    let (kind, optional_at, default_at) = match kind_name {
        "RasterLayer" | "Raster" => (ParameterKind::RasterLayer, 1, 0),
        "FeatureSource" | "Vector" | "Table" => (ParameterKind::FeatureSource, 2, 1),
        "MultipleLayers" | "MultipleInput" => {
            let layer_type = match extra.first().copied() {
                Some("3") | Some("QgsProcessing.TypeRaster") => LayerType::Raster,
                _ => LayerType::Vector,
            };
            (ParameterKind::MultipleLayers { layer_type }, 2, 1)
        }
        "Boolean" => (ParameterKind::Boolean, 1, 0),
        "Number" => {
            let integer = extra.first().map(|t| t.contains("Integer")).unwrap_or(false);
            (ParameterKind::Number { integer }, 2, 1)
        }
        "Enum" | "Selection" => {
            let options = extra
                .first()
                .map(|o| o.split(';').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default();
            (ParameterKind::Enum { options }, 3, 2)
        }
        "Matrix" | "FixedTable" => {
            let headers = extra
                .get(2)
                .map(|h| h.split(';').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default();
            (ParameterKind::Matrix { headers }, 4, 3)
        }
        "Extent" => (ParameterKind::Extent, 1, 0),
        "String" => (ParameterKind::String, 2, 0),
        "File" => (ParameterKind::File, 3, 2),
        "Field" | "TableField" => (ParameterKind::Field { parent: field(1) }, 4, 0),
        "RasterDestination" => (ParameterKind::RasterDestination, 1, 0),
        "VectorDestination" => (ParameterKind::VectorDestination, 2, 1),
        "FileDestination" => {
            let extension = field(0).and_then(|filter| filter_extension(&filter));
            (ParameterKind::FileDestination { extension }, 2, 1)
        }
        other => return Err(format!("unknown parameter type {} in: {}", other, line)),
    };

    Ok(ParameterDescriptor {
        name,
        description,
        kind,
        optional: flag(optional_at),
        default: field(default_at),
    })
}

/// First extension of a file filter such as `Tables (*.txt *.csv)`.
fn filter_extension(filter: &str) -> Option<String> {
    let start = filter.find("*.")? + 2;
    let ext: String = filter[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}
