//! Provider settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Settings controlling how `saga_cmd` is located and how runs are logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SagaSettings {
    /// Folder holding the SAGA installation. `None` means `saga_cmd` is on PATH.
    pub saga_folder: Option<PathBuf>,
    /// Folder where the batch job file is written.
    pub batch_dir: PathBuf,
    /// Log every command sent to SAGA.
    pub log_commands: bool,
    /// Log SAGA console output.
    pub log_console: bool,
}

impl Default for SagaSettings {
    fn default() -> Self {
        Self {
            saga_folder: None,
            batch_dir: std::env::temp_dir().join("sagabridge"),
            log_commands: true,
            log_console: true,
        }
    }
}

impl SagaSettings {
    /// Load settings from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Path of the `saga_cmd` executable.
    pub fn saga_cmd(&self) -> PathBuf {
        let exe = if cfg!(windows) { "saga_cmd.exe" } else { "saga_cmd" };
        match &self.saga_folder {
            Some(folder) => folder.join(exe),
            None => PathBuf::from(exe),
        }
    }

    /// Folder holding the SAGA tool libraries, when the install folder is known.
    pub fn tool_libraries(&self) -> Option<PathBuf> {
        self.saga_folder.as_ref().map(|f| f.join("tools"))
    }
}
