//! Terminal output formatting utilities.

use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use migsync_core::Action;

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Set quiet mode globally. Call once at startup.
pub fn set_quiet(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

/// Print a success message (suppressed in quiet mode).
pub fn success(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "✓".green(), msg);
    }
}

/// Print an error message (always prints to stderr).
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning message (always prints to stderr).
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an info message (suppressed in quiet mode).
pub fn info(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "→".blue(), msg);
    }
}

/// Print a detail line without prefix (suppressed in quiet mode).
///
/// Use for indented detail lines that accompany info or warn messages.
pub fn detail(msg: &str) {
    if !is_quiet() {
        println!("{msg}");
    }
}

/// Print essential output (always prints).
///
/// Use for results a caller relies on even with `--quiet`, like the
/// dry-run plan or the resequence report.
pub fn essential(msg: &str) {
    println!("{msg}");
}

/// Format a planned step for dry-run output.
///
/// `command` is the full command line when the step runs `manage.py`.
#[must_use]
pub fn would(action: &Action, command: Option<&str>) -> String {
    match command {
        Some(command) => format!("would {action} {}", format!("({command})").dimmed()),
        None => format!("would {action}"),
    }
}

/// Print the steps completed before a failure (always prints to stderr).
pub fn completed(actions: &[Action]) {
    if actions.is_empty() {
        eprintln!("No steps completed before the failure.");
        return;
    }
    eprintln!("Completed before the failure (not rolled back):");
    for action in actions {
        eprintln!("  {} {action}", "✓".green());
    }
}
