//! Trait abstractions for project-management operations.
//!
//! This module defines the `ManageTool` trait which abstracts `manage.py`,
//! enabling dependency injection and testability.

use crate::{ManageCommand, Result, ToolOutcome};

/// Trait for running project-management commands.
///
/// This trait abstracts `manage.py` invocations, allowing for:
/// - Dependency injection in the reset and resequence engines
/// - Mock implementations for testing
///
/// A non-zero exit is reported through [`ToolOutcome`], not as an error;
/// errors are reserved for commands that could not be started at all.
#[allow(clippy::missing_errors_doc)]
pub trait ManageTool {
    /// Run a command to completion.
    fn run(&self, command: &ManageCommand) -> Result<ToolOutcome>;

    /// Render the full command line for display (dry-run, logs).
    fn command_line(&self, command: &ManageCommand) -> String;

    /// Query `INSTALLED_APPS` entries.
    ///
    /// Returns `None` when the project settings can't be loaded.
    fn installed_apps(&self) -> Option<Vec<String>>;
}
