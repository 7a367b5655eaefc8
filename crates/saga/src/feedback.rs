//! Progress and message reporting during a run.

use tracing::info;

/// Channel through which a run reports what it is doing.
///
/// Cancellation is advisory: builders never check it mid-build, runners may.
pub trait Feedback {
    /// General information message.
    fn push_info(&mut self, message: &str);

    /// A command line about to be sent to SAGA.
    fn push_command_info(&mut self, command: &str);

    /// A line of SAGA console output.
    fn push_console_info(&mut self, line: &str);

    /// Progress in percent (0-100).
    fn set_progress(&mut self, percent: f64);

    /// Whether the caller asked to stop.
    fn is_canceled(&self) -> bool {
        false
    }
}

/// Feedback that forwards everything to `tracing`.
#[derive(Debug, Default)]
pub struct LogFeedback {
    progress: f64,
}

impl LogFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last reported progress.
    pub fn progress(&self) -> f64 {
        self.progress
    }
}

impl Feedback for LogFeedback {
    fn push_info(&mut self, message: &str) {
        info!("{}", message);
    }

    fn push_command_info(&mut self, command: &str) {
        info!(command, "SAGA command");
    }

    fn push_console_info(&mut self, line: &str) {
        info!(target: "saga_cmd", "{}", line);
    }

    fn set_progress(&mut self, percent: f64) {
        self.progress = percent.clamp(0.0, 100.0);
    }
}
