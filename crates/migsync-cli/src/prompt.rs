//! Operator prompts for the confirmation gate.

use std::io::{self, BufRead, IsTerminal, Write};

use migsync_core::Prompter;

/// Reads answers from the terminal.
///
/// Interactive sessions get an `inquire` prompt; piped input is read one
/// line at a time so scripts can answer with `echo y |`. Prompts go to
/// stderr, leaving stdout to `--json`.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&self, prompt: &str) -> Option<String> {
        if io::stdin().is_terminal() {
            return inquire::Text::new(prompt).prompt().ok();
        }

        eprint!("{prompt} ");
        if io::stderr().flush().is_err() {
            return None;
        }

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => {
                eprintln!();
                None
            }
            Ok(_) => Some(line),
        }
    }
}
