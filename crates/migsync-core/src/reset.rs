//! Migration reset engine.
//!
//! Brings the working tree's migrations back in line with the reference
//! branch: optionally roll affected apps back, delete every local-only
//! migration, run `migrate` once, then check the reference branch out.

use migsync_django::ManageTool;
use migsync_git::GitOps;

use crate::config::RunConfig;
use crate::diff::DiffResult;
use crate::error::Result;
use crate::gate::{Gate, Prompter};
use crate::plan::{Action, ExecutionPlan, ExecutionReport, Executor};

/// What a reset run ended with.
#[derive(Debug)]
pub enum ResetOutcome {
    /// Diff was empty and no checkout was needed.
    NothingToDo,

    /// Dry-run: the plan that would have run.
    DryRun(ExecutionPlan),

    /// The plan ran to completion.
    Applied(ExecutionReport),
}

/// Rollback target for an app: the reference branch's latest migration,
/// or `zero` if it has none.
fn unapply_target(diff: &DiffResult, app: &str) -> String {
    diff.remote
        .latest(app)
        .or_else(|| diff.remote.files(app).last())
        .map_or_else(|| "zero".to_string(), |file| file.name().to_string())
}

/// Build the reset plan.
///
/// `current_branch` is `None` when HEAD is detached.
#[must_use]
pub fn plan_reset(
    diff: &DiffResult,
    config: &RunConfig,
    current_branch: Option<&str>,
) -> ExecutionPlan {
    let mut plan = ExecutionPlan::default();
    let affected: Vec<_> = diff.iter().filter(|d| !d.local_only.is_empty()).collect();

    if config.unapply {
        for app_diff in &affected {
            plan.push(Action::Unapply {
                app: app_diff.app.clone(),
                target: unapply_target(diff, &app_diff.app),
            });
        }
    }

    for app_diff in &affected {
        for file in &app_diff.local_only {
            plan.push(Action::DeleteFile {
                app: app_diff.app.clone(),
                path: file.path.clone(),
            });
        }
    }

    if !affected.is_empty() {
        plan.push(Action::Migrate);
    }

    if !config.skip_checkout && current_branch != Some(config.branch.as_str()) {
        plan.push(Action::Checkout {
            branch: config.branch.clone(),
        });
    }

    plan
}

/// Plan and, unless dry-run, execute a reset.
///
/// # Errors
/// Returns [`crate::Error::NotABranch`] before anything runs if the plan
/// would check out a plain revision, and [`crate::Error::Execution`] naming the failed step and the steps
/// already completed; deletions are not rolled back.
pub fn reset<G: GitOps, M: ManageTool, P: Prompter>(
    diff: &DiffResult,
    config: &RunConfig,
    current_branch: Option<&str>,
    executor: &Executor<'_, G, M>,
    gate: &Gate<'_, P>,
) -> Result<ResetOutcome> {
    let plan = plan_reset(diff, config, current_branch);

    if plan.is_empty() {
        return Ok(ResetOutcome::NothingToDo);
    }
    if config.dry_run {
        return Ok(ResetOutcome::DryRun(plan));
    }

    executor.check_targets(&plan)?;
    let report = executor.execute(&plan, gate)?;
    Ok(ResetOutcome::Applied(report))
}
