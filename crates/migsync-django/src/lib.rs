//! # migsync-django
//!
//! Integration with a Django project's `manage.py` for migsync: interpreter
//! discovery, the `migrate`/`makemigrations` commands and the
//! `INSTALLED_APPS` probe.
//!
//! Every invocation blocks until the child exits. Only the exit status is
//! used to decide success; captured output is informational.

mod apps;
mod command;
mod error;
mod interpreter;
mod runner;
mod traits;

pub use apps::{PROBE_CODE, parse_probe_output};
pub use command::{ManageCommand, ToolOutcome};
pub use error::{Error, Result};
pub use interpreter::Interpreter;
pub use runner::ManagePy;
pub use traits::ManageTool;
