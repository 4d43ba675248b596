//! # migsync-core
//!
//! Engine for reconciling a Django project's migration files with a
//! reference branch.
//!
//! - [`diff`] computes, per app, the migrations present only locally and
//!   only on the reference branch.
//! - [`reset`] plans and runs the discard/migrate/checkout sequence.
//! - [`resequence`] reports feature-only migrations and regenerates them
//!   so their numbers follow the reference branch.
//! - [`gate`] decides whether a mutating step may run.

pub mod config;
pub mod diff;
pub mod error;
pub mod filter;
pub mod gate;
pub mod layout;
pub mod migration;
pub mod plan;
pub mod resequence;
pub mod reset;

#[cfg(test)]
mod test_mocks;

pub use config::{Config, Mode, RunConfig};
pub use diff::{AppDiff, DiffResult, compute_diff};
pub use error::{Error, Result};
pub use filter::AppFilter;
pub use gate::{Gate, Prompter, parse_reply};
pub use layout::{ProjectLayout, find_project_root};
pub use migration::{AppMigrationSet, MigrationFile};
pub use plan::{Action, ExecutionFailure, ExecutionPlan, ExecutionReport, Executor};
pub use resequence::{AppResequence, ResequenceReport, ResequenceRun, ResequenceState};
pub use reset::ResetOutcome;
