//! Terminal colorization for diagnostics
//!
//! Applies ANSI escape codes to `validate` output using crossterm.

use crossterm::style::{Color, Stylize};
use crossterm::tty::IsTty;

use crate::summary::{Diagnostic, Severity};

/// When to colorize output
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Use colors if stdout is a terminal and NO_COLOR is not set
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorChoice {
    pub fn enabled(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => std::env::var("NO_COLOR").is_err() && std::io::stdout().is_tty(),
        }
    }
}

/// Render a diagnostic, red for errors and yellow for everything else
pub fn colorize_diagnostic(diagnostic: &Diagnostic, enabled: bool) -> String {
    let text = diagnostic.to_text();
    if !enabled {
        return text;
    }
    let color = match diagnostic.severity {
        Severity::Error => Color::Red,
        Severity::Explained | Severity::Warning => Color::Yellow,
    };
    format!("{}", text.with(color))
}

/// Green check line for a clean document
pub fn colorize_ok(text: &str, enabled: bool) -> String {
    if enabled {
        format!("{}", text.with(Color::Green))
    } else {
        text.to_string()
    }
}
