//! `--resequence` mode - report migrations created on this branch and,
//! with `--apply`, regenerate them after the reference branch's numbering.

use anyhow::{Context, Result};
use migsync_core::resequence::{self, ResequenceReport, ResequenceState};
use migsync_core::{Error, Executor, Gate, Mode, compute_diff};
use serde_json::json;

use super::Exit;
use super::reset::print_plan;
use super::utils::build_context;
use crate::output;
use crate::prompt::TerminalPrompter;

/// Run the resequence mode.
pub fn run(cli: &super::Cli) -> Result<Exit> {
    let ctx = build_context(cli, Mode::Resequence)?;
    let config = &ctx.config;

    let diff = compute_diff(&ctx.repo, &config.layout, &config.branch, &ctx.filter)
        .with_context(|| format!("Cannot compare migrations with '{}'", config.branch))?;

    let report = ResequenceReport::from_diff(&diff);
    if !cli.json {
        print_report(&report);
    }

    let executor = Executor::new(&ctx.repo, &ctx.tool, &config.layout);
    let prompter = TerminalPrompter;
    let gate = Gate::new(config, &prompter);

    let run = match resequence::resequence(&diff, config, &executor, &gate) {
        Ok(run) => run,
        Err(e) => {
            if let Error::Execution(failure) = &e {
                output::completed(&failure.completed);
            }
            return Err(e.into());
        }
    };

    if cli.json {
        let value = json!({
            "mode": "resequence",
            "branch": config.branch,
            "state": run.state,
            "apps": run.report.apps,
            "plan": run.plan.as_ref().map(|plan| &plan.actions),
            "completed": run.execution.as_ref().map(|report| &report.completed),
        });
        output::essential(&value.to_string());
    }

    match run.state {
        ResequenceState::Aborted => {
            if !cli.json {
                output::essential("Aborted.");
            }
            return Ok(Exit::Declined);
        }
        ResequenceState::Done => {
            let generated = run
                .execution
                .as_ref()
                .map_or(0, |report| report.generated().count());
            output::success(&format!(
                "Regenerated migrations for {generated} app(s). Review the new migrations and commit as needed."
            ));
        }
        _ if report.is_empty() => {}
        _ => match &run.plan {
            Some(plan) if !cli.json => print_plan(plan, &executor),
            Some(_) => {}
            None => output::info("Run with --apply to delete these and run makemigrations"),
        },
    }

    Ok(Exit::Success)
}

fn print_report(report: &ResequenceReport) {
    if report.is_empty() {
        output::success("No feature-only migrations found - nothing to resequence");
        return;
    }

    output::info(&format!(
        "Found {} migration(s) on this branch that are not on '{}':",
        report.total(),
        report.branch
    ));
    for app in &report.apps {
        output::essential(&app.to_string());
    }
    for app in report.apps.iter().filter(|a| !a.missing_from_tree.is_empty()) {
        output::warn(&format!(
            "{} is missing {} migration(s) from '{}' locally - rebase before --apply",
            app.app,
            app.missing_from_tree.len(),
            report.branch
        ));
    }
}
