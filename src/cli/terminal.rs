//! Colors and sizing for the booking views.

use owo_colors::{colors::css, OwoColorize};

/// Whether stdout accepts ANSI colors
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Width of the attached terminal in columns, if there is one
pub fn terminal_width() -> Option<u16> {
    terminal_size::terminal_size().map(|(w, _)| w.0)
}

/// Whether a line of `required` columns would wrap in the current terminal
pub fn is_narrow(required: usize) -> bool {
    terminal_width().is_some_and(|w| usize::from(w) < required)
}

/// Colors for slot states and command feedback
pub trait Colorize {
    /// Free slots and confirmations (green)
    fn success(&self) -> String;
    /// Secrets and load warnings (orange)
    fn warning(&self) -> String;
    /// Booked slots (bold red)
    fn taken(&self) -> String;
    /// Secondary hints
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn success(&self) -> String {
        if supports_color() {
            self.fg::<css::Green>().to_string()
        } else {
            self.to_string()
        }
    }

    fn warning(&self) -> String {
        if supports_color() {
            self.fg::<css::Orange>().to_string()
        } else {
            self.to_string()
        }
    }

    fn taken(&self) -> String {
        if supports_color() {
            self.fg::<css::Red>().bold().to_string()
        } else {
            self.to_string()
        }
    }

    fn dim(&self) -> String {
        if supports_color() {
            self.dimmed().to_string()
        } else {
            self.to_string()
        }
    }
}

impl Colorize for String {
    fn success(&self) -> String {
        self.as_str().success()
    }

    fn warning(&self) -> String {
        self.as_str().warning()
    }

    fn taken(&self) -> String {
        self.as_str().taken()
    }

    fn dim(&self) -> String {
        self.as_str().dim()
    }
}
