//! Per-algorithm customization points.
//!
//! Some tools need their parameters adjusted before the command is built, or
//! their command list rewritten before it runs. Hooks are registered by the
//! algorithm's hook key (its id with `.` replaced by `_`).

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::descriptor::AlgorithmDescriptor;
use crate::parameter::Parameters;

/// Adjusts parameter values before export and command building.
pub type PreProcessHook = fn(&AlgorithmDescriptor, &mut Parameters);
/// Rewrites the full command list before execution.
pub type EditCommandsHook = fn(Vec<String>) -> Vec<String>;

/// Hooks of one algorithm. Missing hooks are no-ops.
#[derive(Clone, Copy, Default)]
pub struct AlgorithmHooks {
    pub pre_process: Option<PreProcessHook>,
    pub edit_commands: Option<EditCommandsHook>,
}

impl fmt::Debug for AlgorithmHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmHooks")
            .field("pre_process", &self.pre_process.is_some())
            .field("edit_commands", &self.edit_commands.is_some())
            .finish()
    }
}

/// Registry of hooks, owned by the session.
#[derive(Debug, Default)]
pub struct HookRegistry {
    hooks: HashMap<String, AlgorithmHooks>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register hooks under `key`, replacing any earlier registration.
    pub fn register(&mut self, key: impl Into<String>, hooks: AlgorithmHooks) {
        self.hooks.insert(key.into(), hooks);
    }

    pub fn get(&self, key: &str) -> Option<&AlgorithmHooks> {
        self.hooks.get(key)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn pre_process(&self, descriptor: &AlgorithmDescriptor, parameters: &mut Parameters) {
        if let Some(hook) = self.get(&descriptor.hook_key()).and_then(|h| h.pre_process) {
            debug!(algorithm = %descriptor.id, "running pre-process hook");
            hook(descriptor, parameters);
        }
    }

    pub fn edit_commands(&self, descriptor: &AlgorithmDescriptor, commands: Vec<String>) -> Vec<String> {
        match self.get(&descriptor.hook_key()).and_then(|h| h.edit_commands) {
            Some(hook) => {
                debug!(algorithm = %descriptor.id, "running command edit hook");
                hook(commands)
            }
            None => commands,
        }
    }
}
