//! One SAGA tool exposed as a processing algorithm.
//!
//! A run goes through three stages:
//!
//! 1. `prepare`: defaults, pre-process hook, layer export, command building
//!    and the command edit hook produce a [`RunPlan`].
//! 2. `execute`: the plan's commands are handed to a [`CommandRunner`].
//! 3. `finalize`: projection sidecars are written and outputs are mapped.
//!
//! `process` chains validation and the three stages.

use std::collections::BTreeMap;
use std::path::Path;

use sagabridge_core::CRS;
use tracing::{debug, info, instrument};

use crate::cache::ExportCache;
use crate::command::{image_grid_commands, CommandBuilder, OutputFiles};
use crate::context::ProcessingContext;
use crate::descriptor::AlgorithmDescriptor;
use crate::error::Result;
use crate::export::{LayerExporter, RunState};
use crate::feedback::Feedback;
use crate::hooks::HookRegistry;
use crate::parameter::Parameters;
use crate::result::{map_outputs, write_sidecars};
use crate::runner::CommandRunner;
use crate::settings::SagaSettings;
use crate::validation::check_parameter_values;

/// State shared by every run of a provider session.
#[derive(Debug, Default)]
pub struct SagaSession {
    pub cache: ExportCache,
    pub hooks: HookRegistry,
    pub settings: SagaSettings,
}

impl SagaSession {
    pub fn new(settings: SagaSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }
}

/// Everything needed to execute and finish one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    /// Export commands, the tool call, then any follow-up commands.
    pub commands: Vec<String>,
    pub outputs: OutputFiles,
    /// CRS captured from the first vector input that had one.
    pub crs: Option<CRS>,
}

/// A SAGA tool loaded from its declaration file.
#[derive(Debug, Clone, PartialEq)]
pub struct SagaAlgorithm {
    descriptor: AlgorithmDescriptor,
}

impl SagaAlgorithm {
    pub fn new(descriptor: AlgorithmDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(AlgorithmDescriptor::from_file(path)?))
    }

    pub fn descriptor(&self) -> &AlgorithmDescriptor {
        &self.descriptor
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn display_name(&self) -> &str {
        &self.descriptor.display_name
    }

    pub fn group(&self) -> &str {
        &self.descriptor.group
    }

    /// Caller values completed with the declared defaults.
    pub fn resolve_parameters(&self, parameters: &Parameters) -> Result<Parameters> {
        let mut resolved = parameters.clone();
        self.descriptor.apply_defaults(&mut resolved)?;
        Ok(resolved)
    }

    /// Reject values SAGA cannot handle (multiband or mismatched grids,
    /// missing required inputs).
    pub fn check_parameter_values(
        &self,
        parameters: &Parameters,
        context: &dyn ProcessingContext,
    ) -> Result<()> {
        let resolved = self.resolve_parameters(parameters)?;
        check_parameter_values(&self.descriptor, &resolved, context)
    }

    /// Export inputs and build the command list without running anything.
    #[instrument(skip_all, fields(algorithm = %self.descriptor.id))]
    pub fn prepare(
        &self,
        session: &mut SagaSession,
        parameters: &Parameters,
        context: &dyn ProcessingContext,
        feedback: &mut dyn Feedback,
    ) -> Result<RunPlan> {
        let mut parameters = self.resolve_parameters(parameters)?;
        session.hooks.pre_process(&self.descriptor, &mut parameters);

        let mut state = RunState::new();
        LayerExporter::new(&mut session.cache, context).export_inputs(
            &self.descriptor,
            &parameters,
            &mut state,
            feedback,
        )?;

        let built = CommandBuilder::new(&self.descriptor, context).build(&parameters, &state)?;
        state.commands.push(built.command);
        state
            .commands
            .extend(image_grid_commands(&self.descriptor, &built.outputs));

        let commands = session.hooks.edit_commands(&self.descriptor, state.commands);
        debug!(count = commands.len(), "run prepared");
        Ok(RunPlan {
            commands,
            outputs: built.outputs,
            crs: state.crs,
        })
    }

    /// Report the commands and hand them to `runner`.
    pub fn execute(
        &self,
        plan: &RunPlan,
        runner: &mut dyn CommandRunner,
        feedback: &mut dyn Feedback,
    ) -> Result<()> {
        feedback.push_info("SAGA execution commands");
        for command in &plan.commands {
            feedback.push_command_info(command);
        }
        runner.run(&plan.commands, feedback)
    }

    /// Write projection sidecars and return the declared outputs.
    pub fn finalize(&self, plan: &RunPlan) -> Result<BTreeMap<String, String>> {
        let written = write_sidecars(plan.crs.as_ref(), &plan.outputs)?;
        debug!(count = written.len(), "projection files written");
        Ok(map_outputs(&self.descriptor, &plan.outputs))
    }

    /// Validate, prepare, execute and finalize one run.
    pub fn process(
        &self,
        session: &mut SagaSession,
        parameters: &Parameters,
        context: &dyn ProcessingContext,
        runner: &mut dyn CommandRunner,
        feedback: &mut dyn Feedback,
    ) -> Result<BTreeMap<String, String>> {
        self.check_parameter_values(parameters, context)?;
        let plan = self.prepare(session, parameters, context, feedback)?;
        self.execute(&plan, runner, feedback)?;
        let outputs = self.finalize(&plan)?;
        info!(algorithm = %self.descriptor.id, outputs = outputs.len(), "SAGA run finished");
        Ok(outputs)
    }
}
