//! migsync CLI - reconcile Django migrations with a reference branch.

use clap::Parser;

mod commands;
mod output;
mod prompt;

use commands::Cli;

fn main() {
    let cli = Cli::parse();

    output::set_quiet(cli.quiet || cli.json);
    init_tracing(cli.verbose);

    let result = if cli.resequence {
        commands::resequence::run(&cli)
    } else {
        commands::reset::run(&cli)
    };

    match result {
        Ok(exit) => std::process::exit(exit.code()),
        Err(e) => {
            output::error(&format!("{e:#}"));
            std::process::exit(1);
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the level picked by `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
