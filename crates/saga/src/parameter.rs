//! Declarative parameter definitions and runtime values.
//!
//! A declaration file produces a list of `ParameterDescriptor`s; the caller
//! supplies a `Parameters` map of `ParamValue`s keyed by parameter name.

use std::collections::BTreeMap;

use sagabridge_core::Extent;

use crate::error::{Result, SagaError};

/// Element type of a multiple-layers parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Raster,
    Vector,
}

/// The kind of a parameter, determining how its value reaches the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
    /// Single raster layer, exported to a SAGA grid when needed.
    RasterLayer,
    /// Single vector layer, handed over as a shapefile.
    FeatureSource,
    /// List of layers of one type.
    MultipleLayers { layer_type: LayerType },
    /// Boolean toggle.
    Boolean,
    /// Table of values with fixed column headers.
    Matrix { headers: Vec<String> },
    /// Output extent, spread over four SAGA numeric parameters.
    Extent,
    /// Numeric value.
    Number { integer: bool },
    /// Selection from a list of options, passed as its index.
    Enum { options: Vec<String> },
    /// Free text.
    String,
    /// Input file path.
    File,
    /// Attribute field of another (vector) parameter.
    Field { parent: Option<String> },
    /// Raster output.
    RasterDestination,
    /// Vector output.
    VectorDestination,
    /// Any other output file (tables, reports).
    FileDestination { extension: Option<String> },
}

impl ParameterKind {
    /// Whether the parameter names an output artifact rather than an input value.
    pub fn is_destination(&self) -> bool {
        matches!(
            self,
            Self::RasterDestination | Self::VectorDestination | Self::FileDestination { .. }
        )
    }

    /// Whether the parameter references layers that may need exporting.
    pub fn is_layer(&self) -> bool {
        matches!(
            self,
            Self::RasterLayer | Self::FeatureSource | Self::MultipleLayers { .. }
        )
    }

    /// Default extension for temporary outputs of this kind.
    pub fn output_extension(&self) -> Option<&str> {
        match self {
            Self::RasterDestination => Some("sdat"),
            Self::VectorDestination => Some("shp"),
            Self::FileDestination { extension } => Some(extension.as_deref().unwrap_or("txt")),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RasterLayer => "raster",
            Self::FeatureSource => "vector",
            Self::MultipleLayers { layer_type: LayerType::Raster } => "multiple rasters",
            Self::MultipleLayers { layer_type: LayerType::Vector } => "multiple vectors",
            Self::Boolean => "boolean",
            Self::Matrix { .. } => "matrix",
            Self::Extent => "extent",
            Self::Number { integer: true } => "integer",
            Self::Number { integer: false } => "number",
            Self::Enum { .. } => "enum",
            Self::String => "string",
            Self::File => "file",
            Self::Field { .. } => "field",
            Self::RasterDestination => "raster output",
            Self::VectorDestination => "vector output",
            Self::FileDestination { .. } => "file output",
        }
    }
}

/// Definition of a single parameter of an algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// SAGA parameter name, also the command-line flag token.
    pub name: String,
    pub description: String,
    pub kind: ParameterKind,
    pub optional: bool,
    /// Default value as written in the declaration file.
    pub default: Option<String>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            optional: false,
            default: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn is_destination(&self) -> bool {
        self.kind.is_destination()
    }

    /// Convert a textual value (command line, config file) into a typed value.
    pub fn parse_value(&self, raw: &str) -> Result<ParamValue> {
        let raw = raw.trim();
        let value = match &self.kind {
            ParameterKind::RasterLayer
            | ParameterKind::FeatureSource
            | ParameterKind::String
            | ParameterKind::File
            | ParameterKind::Field { .. }
            | ParameterKind::RasterDestination
            | ParameterKind::VectorDestination
            | ParameterKind::FileDestination { .. } => ParamValue::Text(raw.to_string()),
            ParameterKind::MultipleLayers { .. } => ParamValue::Layers(split_list(raw, ';')),
            ParameterKind::Boolean => ParamValue::Bool(
                parse_bool(raw)
                    .ok_or_else(|| SagaError::invalid_value(&self.name, format!("not a boolean: {}", raw)))?,
            ),
            ParameterKind::Number { .. } => ParamValue::Number(
                raw.parse()
                    .map_err(|_| SagaError::invalid_value(&self.name, format!("not a number: {}", raw)))?,
            ),
            ParameterKind::Enum { options } => {
                let index = raw
                    .parse::<usize>()
                    .ok()
                    .or_else(|| options.iter().position(|o| o == raw))
                    .ok_or_else(|| SagaError::invalid_value(&self.name, format!("unknown option: {}", raw)))?;
                ParamValue::Enum(index)
            }
            ParameterKind::Matrix { .. } => ParamValue::Matrix(split_cells(raw)),
            ParameterKind::Extent => ParamValue::Extent(
                parse_extent(raw)
                    .ok_or_else(|| SagaError::invalid_value(&self.name, format!("not an extent: {}", raw)))?,
            ),
        };
        Ok(value)
    }
}

/// Runtime parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Explicitly unset.
    Null,
    Bool(bool),
    Number(f64),
    Enum(usize),
    Text(String),
    Layers(Vec<String>),
    Matrix(Vec<String>),
    Extent(Extent),
}

impl ParamValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Enum(i) => Some(*i as f64),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::Number(v) => Some(*v != 0.0),
            Self::Text(s) => parse_bool(s),
            _ => None,
        }
    }

    pub fn as_enum_index(&self) -> Option<usize> {
        match self {
            Self::Enum(i) => Some(*i),
            Self::Number(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as usize),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Layer references held by a single- or multi-layer value.
    pub fn as_layers(&self) -> Vec<String> {
        match self {
            Self::Layers(layers) => layers.clone(),
            Self::Text(s) => split_list(s, ';'),
            _ => Vec::new(),
        }
    }

    /// The value as the host would print it: layer lists are `;`-joined.
    pub fn raw_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(v) => v.to_string(),
            Self::Number(v) => v.to_string(),
            Self::Enum(i) => i.to_string(),
            Self::Text(s) => s.clone(),
            Self::Layers(layers) => layers.join(";"),
            Self::Matrix(values) => values.join(","),
            Self::Extent(e) => format!("{},{},{},{}", e.xmin, e.xmax, e.ymin, e.ymax),
        }
    }

    pub fn as_matrix(&self) -> Vec<String> {
        match self {
            Self::Matrix(values) => values.clone(),
            Self::Text(s) => split_cells(s),
            _ => Vec::new(),
        }
    }

    pub fn as_extent(&self) -> Option<Extent> {
        match self {
            Self::Extent(e) => Some(*e),
            Self::Text(s) => parse_extent(s),
            _ => None,
        }
    }
}

/// Parameter values keyed by parameter name.
pub type Parameters = BTreeMap<String, ParamValue>;

/// Value of `name` if it was supplied and is not `Null`.
pub fn supplied<'a>(parameters: &'a Parameters, name: &str) -> Option<&'a ParamValue> {
    parameters.get(name).filter(|v| !v.is_null())
}

fn split_list(raw: &str, sep: char) -> Vec<String> {
    raw.split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Matrix cells keep their position, so empty cells are kept as `""`.
fn split_cells(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|s| s.trim().to_string()).collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Parse an extent in host order: `xmin,xmax,ymin,ymax`, optionally followed
/// by a bracketed CRS (`[EPSG:4326]`), which is ignored.
fn parse_extent(raw: &str) -> Option<Extent> {
    let coords = raw.split('[').next()?.trim();
    let values: Vec<f64> = coords
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    match values.as_slice() {
        [xmin, xmax, ymin, ymax] => Some(Extent::new(*xmin, *ymin, *xmax, *ymax)),
        _ => None,
    }
}
