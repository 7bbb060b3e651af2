//! Terminal colors for the human report.

use std::io::IsTerminal;

use crate::types::{ColorMode, RuleKind};

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";
pub const BOLD: &str = "\x1b[1m";
pub const RESET: &str = "\x1b[0m";

/// Determines if colors should be used based on ColorMode and terminal detection.
pub fn is_enabled(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stdout().is_terminal(),
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            enabled: is_enabled(mode),
        }
    }

    pub fn error(&self, s: &str) -> String {
        self.wrap(s, RED)
    }

    pub fn warn(&self, s: &str) -> String {
        self.wrap(s, YELLOW)
    }

    pub fn ok(&self, s: &str) -> String {
        self.wrap(s, GREEN)
    }

    pub fn path(&self, s: &str) -> String {
        self.wrap(s, CYAN)
    }

    pub fn header(&self, s: &str) -> String {
        self.wrap(s, BOLD)
    }

    /// Hard Windows failures in red, the advisory existence check in yellow.
    pub fn rule(&self, rule: RuleKind, s: &str) -> String {
        match rule {
            RuleKind::MissingFolder => self.warn(s),
            _ => self.error(s),
        }
    }

    pub fn wrap(&self, s: &str, code: &str) -> String {
        if self.enabled {
            format!("{code}{s}{RESET}")
        } else {
            s.to_string()
        }
    }
}
