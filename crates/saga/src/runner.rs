//! Running command lists through `saga_cmd`.

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use crate::error::{Result, SagaError};
use crate::feedback::Feedback;
use crate::settings::SagaSettings;

/// Executes a list of SAGA command lines, in order.
pub trait CommandRunner {
    fn run(&mut self, commands: &[String], feedback: &mut dyn Feedback) -> Result<()>;
}

/// Writes the commands to a batch job and runs it with the system shell.
#[derive(Debug, Clone)]
pub struct SagaCmdRunner {
    settings: SagaSettings,
}

impl SagaCmdRunner {
    pub fn new(settings: SagaSettings) -> Self {
        Self { settings }
    }

    /// Location of the batch job file.
    pub fn batch_path(&self) -> PathBuf {
        let name = if cfg!(windows) {
            "saga_batch_job.bat"
        } else {
            "saga_batch_job.sh"
        };
        self.settings.batch_dir.join(name)
    }

    /// Batch job text: environment setup, then one `saga_cmd` line per command.
    pub fn batch_script(&self, commands: &[String]) -> String {
        let saga_cmd = self.settings.saga_cmd();
        let mut lines = Vec::with_capacity(commands.len() + 4);
        if cfg!(windows) {
            if let (Some(folder), Some(tools)) = (&self.settings.saga_folder, self.settings.tool_libraries()) {
                lines.push(format!("set SAGA={}", folder.display()));
                lines.push(format!("set SAGA_MLB={}", tools.display()));
                lines.push("PATH=%PATH%;%SAGA%;%SAGA_MLB%".to_string());
            }
        } else {
            lines.push("#!/bin/sh".to_string());
            if let (Some(folder), Some(tools)) = (&self.settings.saga_folder, self.settings.tool_libraries()) {
                lines.push(format!("export SAGA_MLB=\"{}\"", tools.display()));
                lines.push(format!("export PATH=\"{}:$PATH\"", folder.display()));
            }
        }
        for command in commands {
            lines.push(format!("\"{}\" {}", saga_cmd.display(), command));
        }
        lines.push("exit".to_string());
        let mut script = lines.join("\n");
        script.push('\n');
        script
    }

    fn shell(path: &Path) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(path);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg(path);
            cmd
        }
    }

    /// Feed every output line to `feedback`. Returns `false` when the run was
    /// canceled. Lines are decoded lossily since saga_cmd prints in the
    /// console code page.
    fn stream_output(&self, stdout: impl Read, feedback: &mut dyn Feedback) -> Result<bool> {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(true);
            }
            if feedback.is_canceled() {
                return Ok(false);
            }
            let line = String::from_utf8_lossy(&buf);
            self.handle_output_line(line.trim_end_matches(['\n', '\r']), feedback);
        }
    }

    fn handle_output_line(&self, line: &str, feedback: &mut dyn Feedback) {
        // Progress counters are redrawn with carriage returns.
        for segment in line.split('\r').map(str::trim).filter(|s| !s.is_empty()) {
            match parse_progress(segment) {
                Some(percent) => feedback.set_progress(percent),
                None if self.settings.log_console => feedback.push_console_info(segment),
                None => {}
            }
        }
    }
}

impl CommandRunner for SagaCmdRunner {
    fn run(&mut self, commands: &[String], feedback: &mut dyn Feedback) -> Result<()> {
        fs::create_dir_all(&self.settings.batch_dir)?;
        let path = self.batch_path();
        fs::write(&path, self.batch_script(commands))?;
        debug!(path = %path.display(), commands = commands.len(), "wrote batch job");

        if self.settings.log_commands {
            info!("SAGA execution commands\n{}", commands.join("\n"));
        }

        let mut child = Self::shell(&path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr_reader = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut bytes = Vec::new();
                let _ = stderr.read_to_end(&mut bytes);
                String::from_utf8_lossy(&bytes).into_owned()
            })
        });

        let streamed = match child.stdout.take() {
            Some(stdout) => self.stream_output(stdout, feedback),
            None => Err(SagaError::ProcessFailed("stdout of saga_cmd not captured".into())),
        };
        if !matches!(streamed, Ok(true)) {
            // Canceled or unreadable output: stop the job before reporting.
            let _ = child.kill();
        }
        let status = child.wait();
        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        if !streamed? {
            warn!("run canceled, stopped saga_cmd");
            return Err(SagaError::ProcessFailed("canceled".into()));
        }

        let status = status?;
        if !status.success() {
            return Err(SagaError::ProcessFailed(format!(
                "{} ({})",
                status,
                stderr.trim()
            )));
        }
        if !stderr.trim().is_empty() {
            warn!(stderr = %stderr.trim(), "saga_cmd wrote to stderr");
        }
        Ok(())
    }
}

/// Percentage from a progress line such as `45%`, clamped to 0-100.
pub fn parse_progress(line: &str) -> Option<f64> {
    let end = line.find('%')?;
    let digits: String = line[..end]
        .trim_end()
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let percent: f64 = digits.parse().ok()?;
    Some(percent.min(100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::LogFeedback;

    #[derive(Default)]
    struct Collect {
        console: Vec<String>,
        progress: Vec<f64>,
    }

    impl Feedback for Collect {
        fn push_info(&mut self, _message: &str) {}
        fn push_command_info(&mut self, _command: &str) {}
        fn push_console_info(&mut self, line: &str) {
            self.console.push(line.to_string());
        }
        fn set_progress(&mut self, percent: f64) {
            self.progress.push(percent);
        }
    }

    #[test]
    fn test_parse_progress() {
        assert_eq!(parse_progress("45%"), Some(45.0));
        assert_eq!(parse_progress("  100 %"), Some(100.0));
        assert_eq!(parse_progress("step 2 of 3: 7%"), Some(7.0));
        assert_eq!(parse_progress("no progress here"), None);
        assert_eq!(parse_progress("%"), None);
    }

    #[test]
    fn test_output_lines_split_progress_and_console() {
        let runner = SagaCmdRunner::new(SagaSettings::default());
        let mut feedback = Collect::default();
        runner.handle_output_line("Loading grid...", &mut feedback);
        runner.handle_output_line("10%\r20%\r30%", &mut feedback);
        assert_eq!(feedback.console, vec!["Loading grid...".to_string()]);
        assert_eq!(feedback.progress, vec![10.0, 20.0, 30.0]);

        let quiet = SagaCmdRunner::new(SagaSettings {
            log_console: false,
            ..SagaSettings::default()
        });
        let mut feedback = Collect::default();
        quiet.handle_output_line("Loading grid...", &mut feedback);
        assert!(feedback.console.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_batch_script_with_install_folder() {
        let runner = SagaCmdRunner::new(SagaSettings {
            saga_folder: Some(PathBuf::from("/opt/saga")),
            ..SagaSettings::default()
        });
        let script = runner.batch_script(&["ta_morphometry \"Slope\" ".to_string()]);
        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(lines[0], "#!/bin/sh");
        assert_eq!(lines[1], "export SAGA_MLB=\"/opt/saga/tools\"");
        assert_eq!(lines[2], "export PATH=\"/opt/saga:$PATH\"");
        assert_eq!(lines[3], "\"/opt/saga/saga_cmd\" ta_morphometry \"Slope\" ");
        assert_eq!(lines[4], "exit");
        assert!(runner.batch_path().ends_with("saga_batch_job.sh"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_job_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        // A folder without saga_cmd makes every command fail.
        let mut runner = SagaCmdRunner::new(SagaSettings {
            saga_folder: Some(dir.path().join("missing")),
            batch_dir: dir.path().to_path_buf(),
            log_commands: false,
            log_console: false,
        });
        let mut feedback = LogFeedback::new();
        let err = runner
            .run(&["ta_morphometry \"Slope\" ".to_string()], &mut feedback)
            .unwrap_err();
        assert!(matches!(err, SagaError::ProcessFailed(_)));
        assert!(dir.path().join("saga_batch_job.sh").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_output_is_decoded_lossily() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        // Stand-in saga_cmd printing Latin-1 text, then progress.
        let saga_cmd = dir.path().join("saga_cmd");
        fs::write(&saga_cmd, "#!/bin/sh\nprintf 'Gr\\366\\337e\\n50%%\\n'\nexit 0\n").unwrap();
        fs::set_permissions(&saga_cmd, fs::Permissions::from_mode(0o755)).unwrap();

        let mut runner = SagaCmdRunner::new(SagaSettings {
            saga_folder: Some(dir.path().to_path_buf()),
            batch_dir: dir.path().join("batch"),
            log_commands: false,
            log_console: true,
        });
        let mut feedback = Collect::default();
        runner
            .run(&["ta_morphometry \"Slope\" ".to_string()], &mut feedback)
            .unwrap();
        assert_eq!(feedback.console, vec!["Gr\u{fffd}\u{fffd}e".to_string()]);
        assert_eq!(feedback.progress, vec![50.0]);
    }
}
