//! `manage.py` runner.

use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::apps::{PROBE_CODE, parse_probe_output};
use crate::error::{Error, Result};
use crate::{Interpreter, ManageCommand, ManageTool, ToolOutcome};

/// Runs `manage.py` commands for one Django project.
#[derive(Debug, Clone)]
pub struct ManagePy {
    project_root: PathBuf,
    manage_py: PathBuf,
    interpreter: Interpreter,
    stdout_to_stderr: bool,
}

impl ManagePy {
    /// Create a runner for the project at `project_root`.
    ///
    /// # Errors
    /// Returns error if `manage.py` doesn't exist at the root.
    pub fn new(project_root: impl Into<PathBuf>, interpreter: Interpreter) -> Result<Self> {
        let project_root = project_root.into();
        let manage_py = project_root.join("manage.py");
        if !manage_py.is_file() {
            return Err(Error::ManagePyNotFound(project_root));
        }

        Ok(Self {
            project_root,
            manage_py,
            interpreter,
            stdout_to_stderr: false,
        })
    }

    /// Send streamed `manage.py` output to stderr, keeping stdout for
    /// machine-readable results.
    #[must_use]
    pub const fn with_stdout_to_stderr(mut self, enabled: bool) -> Self {
        self.stdout_to_stderr = enabled;
        self
    }

    fn build(&self, command: &ManageCommand) -> Command {
        let mut cmd = Command::new(self.interpreter.program());
        cmd.arg(&self.manage_py)
            .args(command.args())
            .current_dir(&self.project_root);
        cmd
    }
}

impl ManageTool for ManagePy {
    fn run(&self, command: &ManageCommand) -> Result<ToolOutcome> {
        let mut cmd = self.build(command);
        let program = self.interpreter.program().display().to_string();
        tracing::debug!(command = %command, interpreter = %program, "running manage.py");

        if command.captures_output() {
            let output = cmd
                .stdin(Stdio::null())
                .output()
                .map_err(|source| Error::Spawn { program, source })?;

            return Ok(ToolOutcome {
                exit_code: output.status.code(),
                output: String::from_utf8_lossy(&output.stdout).into_owned(),
            });
        }

        if self.stdout_to_stderr {
            cmd.stdout(io::stderr());
        }
        let status = cmd
            .status()
            .map_err(|source| Error::Spawn { program, source })?;
        tracing::debug!(command = %command, code = ?status.code(), "manage.py finished");

        Ok(ToolOutcome {
            exit_code: status.code(),
            output: String::new(),
        })
    }

    fn command_line(&self, command: &ManageCommand) -> String {
        let mut parts = vec![
            self.interpreter.program().display().to_string(),
            self.manage_py.display().to_string(),
        ];
        parts.extend(command.args());
        parts.join(" ")
    }

    fn installed_apps(&self) -> Option<Vec<String>> {
        let probe = ManageCommand::Shell {
            code: PROBE_CODE.into(),
        };

        let outcome = match self.run(&probe) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!(error = %e, "INSTALLED_APPS probe could not start");
                return None;
            }
        };
        if !outcome.succeeded() {
            tracing::debug!(code = %outcome.code_display(), "INSTALLED_APPS probe failed");
            return None;
        }

        match parse_probe_output(&outcome.output) {
            Ok(apps) => apps,
            Err(e) => {
                tracing::debug!(error = %e, "INSTALLED_APPS probe output unreadable");
                None
            }
        }
    }
}
