//! Resequencer: find migrations that exist only on the feature branch and,
//! when asked, regenerate them so their numbers follow the reference
//! branch.
//!
//! A run moves through [`ResequenceState`]:
//!
//! ```text
//! Reported --apply--> ConfirmPending --yes--> Executing --> Done
//!                            |                    |
//!                            +--no--> Aborted     +--> Failed
//! ```

use std::fmt;

use migsync_django::ManageTool;
use migsync_git::GitOps;
use serde::Serialize;

use crate::config::RunConfig;
use crate::diff::DiffResult;
use crate::error::{Error, Result};
use crate::gate::{Gate, Prompter};
use crate::migration::{MigrationFile, format_sequence};
use crate::plan::{Action, ExecutionPlan, ExecutionReport, Executor};

/// Question asked once before any file is deleted.
pub const CONFIRM_PROMPT: &str = "Delete these migrations and run makemigrations? [y/N]";

/// Feature-only migrations of one app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppResequence {
    /// App (project-relative directory).
    pub app: String,
    /// Local files missing from the reference branch, in order.
    pub feature_only: Vec<MigrationFile>,
    /// Highest sequence number on the reference branch.
    pub reference_max: Option<u32>,
    /// Reference files missing from the working tree.
    pub missing_from_tree: Vec<MigrationFile>,
}

impl fmt::Display for AppResequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.feature_only.len();
        let noun = if count == 1 { "migration" } else { "migrations" };
        let files: Vec<&str> = self.feature_only.iter().map(|f| f.filename.as_str()).collect();
        write!(
            f,
            "{}: {count} feature-only {noun} ({}), reference max = {}",
            self.app,
            files.join(", "),
            format_sequence(self.reference_max)
        )
    }
}

/// Per-app feature-only migrations against a reference branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResequenceReport {
    /// Reference branch.
    pub branch: String,
    /// Apps needing resequencing, in app order.
    pub apps: Vec<AppResequence>,
}

impl ResequenceReport {
    /// Build the report from a diff.
    ///
    /// Apps without feature-only files are skipped, as are apps with no
    /// migrations on the reference branch: their numbering can't collide.
    #[must_use]
    pub fn from_diff(diff: &DiffResult) -> Self {
        let apps = diff
            .iter()
            .filter(|d| !d.local_only.is_empty())
            .filter(|d| !diff.remote.files(&d.app).is_empty())
            .map(|d| AppResequence {
                app: d.app.clone(),
                feature_only: d.local_only.clone(),
                reference_max: diff.remote.max_sequence(&d.app),
                missing_from_tree: d.remote_only.clone(),
            })
            .collect();

        Self {
            branch: diff.branch.clone(),
            apps,
        }
    }

    /// Total number of feature-only files.
    #[must_use]
    pub fn total(&self) -> usize {
        self.apps.iter().map(|a| a.feature_only.len()).sum()
    }

    /// Check if nothing needs resequencing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

/// Build the apply plan: every deletion first, then one `makemigrations`
/// per app in app order.
#[must_use]
pub fn plan_resequence(report: &ResequenceReport) -> ExecutionPlan {
    let mut plan = ExecutionPlan::default();

    for app in &report.apps {
        for file in &app.feature_only {
            plan.push(Action::DeleteFile {
                app: app.app.clone(),
                path: file.path.clone(),
            });
        }
    }
    for app in &report.apps {
        plan.push(Action::MakeMigrations {
            app: app.app.clone(),
        });
    }

    plan
}

/// Where a resequence run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResequenceState {
    /// Report printed; nothing changed.
    Reported,
    /// Waiting for the operator.
    ConfirmPending,
    /// Deleting and regenerating.
    Executing,
    /// Operator declined; nothing changed.
    Aborted,
    /// All apps regenerated.
    Done,
    /// A step failed part-way.
    Failed,
}

impl fmt::Display for ResequenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reported => "reported",
            Self::ConfirmPending => "confirm-pending",
            Self::Executing => "executing",
            Self::Aborted => "aborted",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of a resequence run that didn't fail.
#[derive(Debug, Clone, Serialize)]
pub struct ResequenceRun {
    /// Final state.
    pub state: ResequenceState,
    /// What was found.
    pub report: ResequenceReport,
    /// Apply plan, when apply mode was requested.
    pub plan: Option<ExecutionPlan>,
    /// Completed steps, when the plan ran.
    pub execution: Option<ExecutionReport>,
}

impl ResequenceRun {
    fn transition(&mut self, next: ResequenceState) {
        tracing::debug!(from = %self.state, to = %next, "resequence state");
        self.state = next;
    }
}

/// Report feature-only migrations and, in apply mode, regenerate them.
///
/// Dry-run stops after planning with the state still `Reported`, even when
/// the working tree is behind the reference branch.
///
/// # Errors
/// Returns `BehindReference` before touching anything if an affected app is
/// missing reference migrations locally, or [`Error::Execution`] when a
/// step fails; deleted files are not restored.
pub fn resequence<G: GitOps, M: ManageTool, P: Prompter>(
    diff: &DiffResult,
    config: &RunConfig,
    executor: &Executor<'_, G, M>,
    gate: &Gate<'_, P>,
) -> Result<ResequenceRun> {
    let mut run = ResequenceRun {
        state: ResequenceState::Reported,
        report: ResequenceReport::from_diff(diff),
        plan: None,
        execution: None,
    };

    if !config.apply || run.report.is_empty() {
        return Ok(run);
    }

    let plan = plan_resequence(&run.report);
    run.plan = Some(plan.clone());
    if config.dry_run {
        return Ok(run);
    }

    if let Some(behind) = run.report.apps.iter().find(|a| !a.missing_from_tree.is_empty()) {
        return Err(Error::BehindReference {
            app: behind.app.clone(),
            missing: behind
                .missing_from_tree
                .iter()
                .map(|f| f.filename.clone())
                .collect(),
        });
    }

    run.transition(ResequenceState::ConfirmPending);
    if !gate.confirm(CONFIRM_PROMPT) {
        run.transition(ResequenceState::Aborted);
        return Ok(run);
    }

    run.transition(ResequenceState::Executing);
    match executor.execute(&plan, gate) {
        Ok(report) => {
            run.execution = Some(report);
            run.transition(ResequenceState::Done);
            Ok(run)
        }
        Err(failure) => {
            run.transition(ResequenceState::Failed);
            Err(failure.into())
        }
    }
}
