//! Command-line interface and the two run modes.

use std::path::PathBuf;

use clap::Parser;

pub mod resequence;
pub mod reset;
pub mod utils;

/// Reconcile a Django project's migration files with a reference branch.
///
/// By default, deletes migrations that exist only in the working tree, runs
/// `migrate` and checks out the reference branch. With `--resequence`,
/// reports migrations created on this branch and, with `--apply`, deletes
/// and regenerates them so their numbers follow the reference branch.
#[derive(Parser, Debug)]
#[command(name = "migsync", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Reference branch [default: $DEV_BRANCH, migsync.toml, "dev"]
    #[arg(short, long, env = "DEV_BRANCH", value_name = "NAME")]
    pub branch: Option<String>,

    /// Print what would happen without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Stay on the current branch after resetting
    #[arg(long, conflicts_with = "resequence")]
    pub skip_checkout: bool,

    /// Report migrations that exist only on this branch
    #[arg(short, long)]
    pub resequence: bool,

    /// Delete the reported migrations and run makemigrations
    #[arg(long, requires = "resequence")]
    pub apply: bool,

    /// Answer yes to the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Reset even when already on the reference branch
    #[arg(long, conflicts_with = "resequence")]
    pub force: bool,

    /// Roll each affected app's schema back before deleting its migrations
    #[arg(long, conflicts_with = "resequence")]
    pub unapply: bool,

    /// Only consider this app (label or path); repeatable
    #[arg(long = "app", value_name = "LABEL")]
    pub apps: Vec<String>,

    /// Django project root [default: nearest directory with manage.py]
    #[arg(long, value_name = "PATH")]
    pub project_root: Option<PathBuf>,

    /// Print the plan or report as JSON
    #[arg(long)]
    pub json: bool,

    /// Show debug logs
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors and essential output
    #[arg(short, long)]
    pub quiet: bool,
}

/// How a run that didn't fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Success, dry-run or nothing to do.
    Success,
    /// The operator declined the confirmation prompt.
    Declined,
}

impl Exit {
    /// Process exit code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Declined => 3,
        }
    }
}
