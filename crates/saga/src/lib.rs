//! # SagaBridge
//!
//! Runs SAGA GIS tools through `saga_cmd` on behalf of a geoprocessing host.
//!
//! Each tool is described by a small declaration file. For a run, the bridge
//! checks the inputs, converts layers into formats SAGA reads, builds the
//! command lines, executes them and tags the outputs with the input CRS.
//!
//! ```no_run
//! use sagabridge::{
//!     LocalContext, LogFeedback, Parameters, SagaAlgorithm, SagaCmdRunner, SagaSession,
//!     SagaSettings,
//! };
//!
//! let alg = SagaAlgorithm::from_file("descriptions/FillSinks.txt")?;
//! let mut session = SagaSession::new(SagaSettings::default());
//! let mut runner = SagaCmdRunner::new(session.settings.clone());
//! let mut params = Parameters::new();
//! params.insert("DEM".into(), alg.descriptor().parameter("DEM").unwrap().parse_value("dem.tif")?);
//!
//! let outputs = alg.process(
//!     &mut session,
//!     &params,
//!     &LocalContext::in_system_temp(),
//!     &mut runner,
//!     &mut LogFeedback::new(),
//! )?;
//! # Ok::<(), sagabridge::SagaError>(())
//! ```

pub mod algorithm;
pub mod cache;
pub mod command;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod export;
pub mod feedback;
pub mod hooks;
pub mod naming;
pub mod parameter;
pub mod provider;
pub mod result;
pub mod runner;
pub mod settings;
pub mod validation;

pub use algorithm::{RunPlan, SagaAlgorithm, SagaSession};
pub use cache::ExportCache;
pub use command::{format_number, BuiltCommand, CommandBuilder, OutputFiles};
pub use context::{LocalContext, ProcessingContext};
pub use descriptor::AlgorithmDescriptor;
pub use error::{Result, SagaError};
pub use export::{LayerExporter, RunState};
pub use feedback::{Feedback, LogFeedback};
pub use hooks::{AlgorithmHooks, HookRegistry};
pub use parameter::{LayerType, ParamValue, ParameterDescriptor, ParameterKind, Parameters};
pub use provider::load_algorithms;
pub use runner::{CommandRunner, SagaCmdRunner};
pub use settings::SagaSettings;
pub use validation::check_parameter_values;
