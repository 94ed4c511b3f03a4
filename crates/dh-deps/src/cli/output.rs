//! Output formatting for CLI.

use console::{style, Term};
use std::io::Write;

/// Verbosity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

/// Output handler for CLI
pub struct Output {
    term: Term,
    verbosity: Verbosity,
}

impl Output {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            term: Term::stderr(),
            verbosity,
        }
    }

    fn should_output(&self, min_verbosity: Verbosity) -> bool {
        self.verbosity >= min_verbosity
    }

    /// Write a line
    pub fn writeln(&self, message: &str) {
        if self.should_output(Verbosity::Normal) {
            let _ = writeln!(&self.term, "{}", message);
        }
    }

    /// Write an info message
    pub fn info(&self, message: &str) {
        if self.should_output(Verbosity::Normal) {
            let _ = writeln!(&self.term, "{}", style(message).cyan());
        }
    }

    /// Write a success message
    pub fn success(&self, message: &str) {
        if self.should_output(Verbosity::Normal) {
            let _ = writeln!(&self.term, "{}", style(message).green());
        }
    }

    /// Write a warning message
    pub fn warning(&self, message: &str) {
        let _ = writeln!(&self.term, "{} {}", style("Warning:").yellow().bold(), message);
    }

    /// Write a verbose message
    pub fn verbose(&self, message: &str) {
        if self.should_output(Verbosity::Verbose) {
            let _ = writeln!(&self.term, "{}", style(message).dim());
        }
    }

    /// Write a section header
    pub fn section(&self, title: &str) {
        if self.should_output(Verbosity::Normal) {
            let _ = writeln!(&self.term, "{}", style(title).bold());
            let _ = writeln!(&self.term, "{}", "-".repeat(title.len()));
        }
    }

    /// Write an aligned `label: value` line
    pub fn field(&self, label: &str, value: &str) {
        if self.should_output(Verbosity::Normal) {
            let _ = writeln!(&self.term, "{:>12}: {}", style(label).green(), value);
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new(Verbosity::Normal)
    }
}
