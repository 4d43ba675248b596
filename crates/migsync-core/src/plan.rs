//! Execution plans and the executor that carries them out.
//!
//! A plan is the complete list of mutating steps, computed before anything
//! is touched so dry-run can print it verbatim. Execution stops at the
//! first failing step; completed steps are never undone.

use std::fmt;
use std::fs;
use std::io;

use migsync_django::{ManageCommand, ManageTool};
use migsync_git::GitOps;
use serde::Serialize;

use crate::error::Error;
use crate::gate::{Gate, Prompter};
use crate::layout::ProjectLayout;
use crate::migration::app_label;

/// One mutating step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Roll an app's schema back to `target` (a migration name or `zero`).
    Unapply { app: String, target: String },
    /// Remove a migration file (project-relative path).
    DeleteFile { app: String, path: String },
    /// Apply pending migrations for the whole project.
    Migrate,
    /// Generate fresh migrations for an app.
    MakeMigrations { app: String },
    /// Check out the reference branch.
    Checkout { branch: String },
}

impl Action {
    /// The `manage.py` command this action runs, if any.
    #[must_use]
    pub fn manage_command(&self) -> Option<ManageCommand> {
        match self {
            Self::Unapply { app, target } => Some(ManageCommand::MigrateTo {
                app: app_label(app).to_string(),
                target: target.clone(),
            }),
            Self::Migrate => Some(ManageCommand::Migrate),
            Self::MakeMigrations { app } => Some(ManageCommand::MakeMigrations {
                app: app_label(app).to_string(),
            }),
            Self::DeleteFile { .. } | Self::Checkout { .. } => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unapply { app, target } => write!(f, "roll back {app} to {target}"),
            Self::DeleteFile { path, .. } => write!(f, "delete {path}"),
            Self::Migrate => write!(f, "run migrate"),
            Self::MakeMigrations { app } => write!(f, "run makemigrations {}", app_label(app)),
            Self::Checkout { branch } => write!(f, "checkout {branch}"),
        }
    }
}

/// Ordered list of steps for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    /// Steps in execution order.
    pub actions: Vec<Action>,
}

impl ExecutionPlan {
    /// Check if there is nothing to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Append a step.
    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Paths the plan deletes.
    pub fn deletions(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().filter_map(|action| match action {
            Action::DeleteFile { path, .. } => Some(path.as_str()),
            _ => None,
        })
    }
}

/// Steps that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    /// Completed steps in order.
    pub completed: Vec<Action>,
}

impl ExecutionReport {
    /// Paths deleted so far.
    pub fn deleted(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().filter_map(|action| match action {
            Action::DeleteFile { path, .. } => Some(path.as_str()),
            _ => None,
        })
    }

    /// Apps whose migrations were regenerated.
    pub fn generated(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().filter_map(|action| match action {
            Action::MakeMigrations { app } => Some(app.as_str()),
            _ => None,
        })
    }
}

/// A plan that stopped part-way.
#[derive(Debug, thiserror::Error)]
#[error("{failed} failed")]
pub struct ExecutionFailure {
    /// The step that failed.
    pub failed: Action,
    /// Why it failed.
    #[source]
    pub error: Error,
    /// Steps completed before the failure (not rolled back).
    pub completed: Vec<Action>,
}

impl ExecutionFailure {
    /// The completed steps as a report.
    #[must_use]
    pub fn report(&self) -> ExecutionReport {
        ExecutionReport {
            completed: self.completed.clone(),
        }
    }
}

/// Carries out plans against the repository, `manage.py` and the filesystem.
pub struct Executor<'a, G: GitOps, M: ManageTool> {
    repo: &'a G,
    tool: &'a M,
    layout: &'a ProjectLayout,
}

impl<'a, G: GitOps, M: ManageTool> Executor<'a, G, M> {
    /// Create an executor.
    #[must_use]
    pub const fn new(repo: &'a G, tool: &'a M, layout: &'a ProjectLayout) -> Self {
        Self { repo, tool, layout }
    }

    /// The `manage.py` command line an action would run, for display.
    #[must_use]
    pub fn describe(&self, action: &Action) -> String {
        action.manage_command().map_or_else(
            || action.to_string(),
            |command| self.tool.command_line(&command),
        )
    }

    /// Check that every checkout in the plan names a branch, before any
    /// step runs.
    ///
    /// # Errors
    /// Returns `NotABranch` for the first checkout target that is only a
    /// revision (a tag, a commit id or a spelled-out remote ref).
    pub fn check_targets(&self, plan: &ExecutionPlan) -> Result<(), Error> {
        let revision = plan.actions.iter().find_map(|action| match action {
            Action::Checkout { branch } if !self.repo.can_checkout(branch) => Some(branch),
            _ => None,
        });

        revision.map_or(Ok(()), |branch| Err(Error::NotABranch(branch.clone())))
    }

    /// Run every step the gate allows, in order.
    ///
    /// # Errors
    /// Returns the failing step, its error and the steps already completed.
    pub fn execute<P: Prompter>(
        &self,
        plan: &ExecutionPlan,
        gate: &Gate<'_, P>,
    ) -> Result<ExecutionReport, ExecutionFailure> {
        let mut report = ExecutionReport::default();

        for action in &plan.actions {
            if !gate.should_execute(action) {
                tracing::debug!(%action, "skipped by gate");
                continue;
            }

            tracing::info!(%action, "executing");
            if let Err(error) = self.run(action) {
                tracing::debug!(%action, error = %error, "step failed");
                return Err(ExecutionFailure {
                    failed: action.clone(),
                    error,
                    completed: report.completed,
                });
            }
            report.completed.push(action.clone());
        }

        Ok(report)
    }

    fn run(&self, action: &Action) -> Result<(), Error> {
        match action {
            Action::DeleteFile { path, .. } => self.delete(path),
            Action::Checkout { branch } => Ok(self.repo.checkout(branch)?),
            Action::Unapply { .. } | Action::Migrate | Action::MakeMigrations { .. } => {
                let Some(command) = action.manage_command() else {
                    return Ok(());
                };
                let outcome = self.tool.run(&command)?;
                if outcome.succeeded() {
                    return Ok(());
                }

                let code = outcome.code_display();
                Err(match action {
                    Action::MakeMigrations { app } => Error::GenerationFailed {
                        app: app.clone(),
                        code,
                    },
                    _ => Error::MigrateFailed { code },
                })
            }
        }
    }

    fn delete(&self, path: &str) -> Result<(), Error> {
        let absolute = self.layout.absolute(path);
        match fs::remove_file(&absolute) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path, "already gone");
                Ok(())
            }
            Err(source) => Err(Error::FileSystem {
                path: absolute,
                source,
            }),
        }
    }
}
