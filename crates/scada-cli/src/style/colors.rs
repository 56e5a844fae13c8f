//! Semantic color palette for terminal output.

use owo_colors::{OwoColorize, Style};

/// Healthy readings and passed checks.
pub fn success_style() -> Style {
    Style::new().green().bold()
}

/// Alarms, ruptures, and failed checks.
pub fn error_style() -> Style {
    Style::new().red().bold()
}

/// Adversary activity.
pub fn warning_style() -> Style {
    Style::new().yellow()
}

/// Secondary text such as timestamps.
pub fn muted_style() -> Style {
    Style::new().dimmed()
}

pub fn header_style() -> Style {
    Style::new().bold()
}

/// Seeds, paths, and commands.
pub fn code_style() -> Style {
    Style::new().blue()
}

/// Trait extension to apply semantic styles.
pub trait SemanticStyle: Sized {
    fn success(&self) -> String;
    fn error(&self) -> String;
    fn warning(&self) -> String;
    fn muted(&self) -> String;
    fn header(&self) -> String;
    fn code(&self) -> String;
}

impl<T: std::fmt::Display> SemanticStyle for T {
    fn success(&self) -> String {
        styled(self, success_style())
    }

    fn error(&self) -> String {
        styled(self, error_style())
    }

    fn warning(&self) -> String {
        styled(self, warning_style())
    }

    fn muted(&self) -> String {
        styled(self, muted_style())
    }

    fn header(&self) -> String {
        styled(self, header_style())
    }

    fn code(&self) -> String {
        styled(self, code_style())
    }
}

fn styled(value: &impl std::fmt::Display, style: Style) -> String {
    if super::no_color() {
        value.to_string()
    } else {
        value.style(style).to_string()
    }
}
