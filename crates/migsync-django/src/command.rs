//! `manage.py` commands and their outcomes.

use std::fmt;

/// A `manage.py` subcommand migsync knows how to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManageCommand {
    /// Apply all pending migrations for the whole project.
    Migrate,

    /// Migrate one app to a target migration name (or `zero`).
    MigrateTo {
        /// App label.
        app: String,
        /// Migration name without `.py`, or `zero`.
        target: String,
    },

    /// Generate new migrations for one app.
    MakeMigrations {
        /// App label.
        app: String,
    },

    /// Run Python code inside the project's Django shell.
    Shell {
        /// Code passed to `shell -c`.
        code: String,
    },
}

impl ManageCommand {
    /// Arguments following `manage.py`.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Migrate => vec!["migrate".into(), "--noinput".into()],
            Self::MigrateTo { app, target } => vec![
                "migrate".into(),
                app.clone(),
                target.clone(),
                "--noinput".into(),
            ],
            Self::MakeMigrations { app } => vec!["makemigrations".into(), app.clone()],
            Self::Shell { code } => vec!["shell".into(), "-c".into(), code.clone()],
        }
    }

    /// Whether output should be captured instead of streamed to the terminal.
    #[must_use]
    pub const fn captures_output(&self) -> bool {
        matches!(self, Self::Shell { .. })
    }
}

impl fmt::Display for ManageCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "manage.py {}", self.args().join(" "))
    }
}

/// Result of one external invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutcome {
    /// Exit code; `None` when terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured stdout (empty when output was streamed).
    pub output: String,
}

impl ToolOutcome {
    /// Outcome of a process that exited with `code`.
    #[must_use]
    pub fn exited(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            output: String::new(),
        }
    }

    /// Whether the command exited with status zero.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }

    /// Exit code formatted for messages.
    #[must_use]
    pub fn code_display(&self) -> String {
        self.exit_code
            .map_or_else(|| "signal".to_string(), |code| code.to_string())
    }
}
