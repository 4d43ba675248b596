//! Confirmation and dry-run gate consulted before every mutating step.

use crate::config::RunConfig;
use crate::plan::Action;

/// Source of operator answers.
pub trait Prompter {
    /// Show `prompt` and read one line.
    ///
    /// Returns `None` on end of input or interrupt.
    fn ask(&self, prompt: &str) -> Option<String>;
}

/// Interpret an operator reply: `y`/`yes` in any case accepts, anything
/// else declines.
#[must_use]
pub fn parse_reply(reply: &str) -> bool {
    matches!(reply.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Policy over the run's dry-run and auto-confirm flags.
pub struct Gate<'a, P: Prompter> {
    config: &'a RunConfig,
    prompter: &'a P,
}

impl<'a, P: Prompter> Gate<'a, P> {
    /// Create a gate for a run.
    #[must_use]
    pub const fn new(config: &'a RunConfig, prompter: &'a P) -> Self {
        Self { config, prompter }
    }

    /// Whether a mutating step may run. Never prompts.
    #[must_use]
    pub const fn should_execute(&self, _action: &Action) -> bool {
        !self.config.dry_run
    }

    /// Ask the operator to confirm, unless auto-confirm is set.
    #[must_use]
    pub fn confirm(&self, prompt: &str) -> bool {
        if self.config.auto_confirm {
            return true;
        }
        self.prompter
            .ask(prompt)
            .is_some_and(|reply| parse_reply(&reply))
    }
}
