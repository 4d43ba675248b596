//! Default mode - discard local-only migrations and return to the reference
//! branch.

use anyhow::{Context, Result};
use migsync_core::reset::{self, ResetOutcome};
use migsync_core::{Action, DiffResult, Error, ExecutionPlan, Executor, Gate, Mode, compute_diff};
use migsync_django::ManageTool;
use migsync_git::GitOps;
use serde_json::json;

use super::Exit;
use super::utils::build_context;
use crate::output;
use crate::prompt::TerminalPrompter;

/// Run the reset mode.
pub fn run(cli: &super::Cli) -> Result<Exit> {
    let ctx = build_context(cli, Mode::Reset)?;
    let config = &ctx.config;

    let current = ctx.repo.current_branch().ok();
    if current.as_deref() == Some(config.branch.as_str()) && !config.force && !config.dry_run {
        output::info(&format!(
            "Already on '{}' - nothing to reset (use --force to run anyway)",
            config.branch
        ));
        return Ok(Exit::Success);
    }

    let diff = compute_diff(&ctx.repo, &config.layout, &config.branch, &ctx.filter)
        .with_context(|| format!("Cannot compare migrations with '{}'", config.branch))?;

    if !cli.json {
        print_diff(&diff);
    }

    let executor = Executor::new(&ctx.repo, &ctx.tool, &config.layout);
    let prompter = TerminalPrompter;
    let gate = Gate::new(config, &prompter);

    match reset::reset(&diff, config, current.as_deref(), &executor, &gate) {
        Ok(ResetOutcome::NothingToDo) => {
            if cli.json {
                print_json(&config.branch, "nothing_to_do", &ExecutionPlan::default(), &[]);
            }
            output::success(&format!("Migrations already match '{}'", config.branch));
        }
        Ok(ResetOutcome::DryRun(plan)) => {
            if let Err(e) = executor.check_targets(&plan) {
                output::warn(&e.to_string());
            }
            if cli.json {
                print_json(&config.branch, "dry_run", &plan, &[]);
            } else {
                print_plan(&plan, &executor);
            }
        }
        Ok(ResetOutcome::Applied(report)) => {
            if cli.json {
                let plan = reset::plan_reset(&diff, config, current.as_deref());
                print_json(&config.branch, "applied", &plan, &report.completed);
            }
            let deleted = report.deleted().count();
            output::success(&format!(
                "Removed {deleted} local-only migration(s); migrations now match '{}'",
                config.branch
            ));
        }
        Err(e) => {
            if let Error::Execution(failure) = &e {
                output::completed(&failure.completed);
            }
            return Err(e.into());
        }
    }

    Ok(Exit::Success)
}

fn print_diff(diff: &DiffResult) {
    for app_diff in diff.iter().filter(|d| !d.local_only.is_empty()) {
        output::info(&format!(
            "{}: {} local-only migration(s)",
            app_diff.app,
            app_diff.local_only.len()
        ));
        for file in &app_diff.local_only {
            output::detail(&format!("  {}", file.path));
        }
    }
}

/// Print every planned step, always, including in quiet mode.
pub fn print_plan<G: GitOps, M: ManageTool>(plan: &ExecutionPlan, executor: &Executor<'_, G, M>) {
    output::info("Dry run - no changes made");
    for action in &plan.actions {
        let command = action.manage_command().map(|_| executor.describe(action));
        output::essential(&output::would(action, command.as_deref()));
    }
}

fn print_json(branch: &str, outcome: &str, plan: &ExecutionPlan, completed: &[Action]) {
    let value = json!({
        "mode": "reset",
        "branch": branch,
        "outcome": outcome,
        "plan": plan.actions,
        "completed": completed,
    });
    output::essential(&value.to_string());
}
