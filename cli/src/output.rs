//! Terminal output utilities for styled CLI output.
//!
//! Status lines go to stderr; results that scripts may capture (hashes, JSON,
//! tables) go to stdout through [`Output::print`].

use console::{Term, style};
use std::fmt::Display;

/// Terminal output helper for consistent styled output.
pub struct Output {
    status: Term,
    results: Term,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self {
            status: Term::stderr(),
            results: Term::stdout(),
        }
    }

    /// Print a success message with a green checkmark.
    pub fn success(&self, message: impl Display) {
        drop(
            self.status
                .write_line(&format!("{} {}", style("✓").green().bold(), message)),
        );
    }

    /// Print an error message with a red X.
    pub fn error(&self, message: impl Display) {
        drop(
            self.status
                .write_line(&format!("{} {}", style("✗").red().bold(), message)),
        );
    }

    /// Print an info message with a blue info icon.
    pub fn info(&self, message: impl Display) {
        drop(
            self.status
                .write_line(&format!("{} {}", style("ℹ").blue().bold(), message)),
        );
    }

    /// Print a result line on stdout without any prefix.
    pub fn print(&self, message: impl Display) {
        drop(self.results.write_line(&message.to_string()));
    }

    /// Print a dimmed message.
    pub fn dim(&self, message: impl Display) {
        drop(self.status.write_line(&style(message).dim().to_string()));
    }
}
