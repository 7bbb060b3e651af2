use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OutputMode {
    Human,
    Json,
}

/// Which analysis the CLI runs.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, clap::ValueEnum)]
pub enum Mode {
    /// Inspect paths without executing anything.
    #[default]
    Static,
    /// Run the script inside an isolated virtual environment.
    Dynamic,
}

/// Where a path candidate was found.
///
/// `SourceLine` numbers are 1-based, matching editor line numbers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Origin {
    /// A bare command line; diagnostics carry no line prefix.
    CommandLine,
    /// A literal found in source code on the given line.
    SourceLine(usize),
}

impl Origin {
    pub fn line(self) -> Option<usize> {
        match self {
            Origin::CommandLine => None,
            Origin::SourceLine(line) => Some(line),
        }
    }
}

/// A path-like string pulled out of the input, tagged with where it came from.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PathCandidate {
    pub raw: String,
    pub origin: Origin,
}

impl PathCandidate {
    pub fn new(raw: impl Into<String>, origin: Origin) -> Self {
        Self {
            raw: raw.into(),
            origin,
        }
    }
}

/// Per-run settings shared by every rule evaluation.
///
/// The declared root relaxes the drive-letter rule for command input and is
/// the base for existence checks. Without one, existence is resolved against
/// the working directory captured at construction.
#[derive(Clone, Debug)]
pub struct ValidationContext {
    declared_root: Option<String>,
    base: PathBuf,
}

impl ValidationContext {
    /// Build a context from an optional root. An empty root counts as unset.
    pub fn new(root: Option<&str>) -> Self {
        let declared_root = root.filter(|r| !r.is_empty()).map(str::to_string);
        let base = match &declared_root {
            Some(root) => PathBuf::from(root),
            None => std::env::current_dir().unwrap_or_default(),
        };
        Self {
            declared_root,
            base,
        }
    }

    pub fn has_declared_root(&self) -> bool {
        self.declared_root.is_some()
    }

    pub fn declared_root(&self) -> Option<&str> {
        self.declared_root.as_deref()
    }

    /// Directory that relative candidates are joined onto.
    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new(None)
    }
}

/// The six path rules, in evaluation order.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    UncWorkingDirectory,
    IllegalCharacters,
    MixedSlashes,
    MissingDriveLetter,
    ReservedDeviceName,
    MissingFolder,
}

/// One reported problem. `Display` renders the final user-facing line,
/// including the `Line <n>: ` prefix for source-derived candidates.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    pub rule: RuleKind,
    pub origin: Origin,
    /// The candidate exactly as extracted (untrimmed).
    pub path: String,
    /// Message body without the line prefix.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            Origin::CommandLine => f.write_str(&self.message),
            Origin::SourceLine(line) => write!(f, "Line {line}: {}", self.message),
        }
    }
}

/// How the input was interpreted.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    File,
    Command,
}

/// Which extractor produced the candidates.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Structural,
    Lexical,
    Command,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_root_counts_as_unset() {
        let ctx = ValidationContext::new(Some(""));
        assert!(!ctx.has_declared_root());
        assert_eq!(ctx.declared_root(), None);
    }

    #[test]
    fn declared_root_becomes_base() {
        let ctx = ValidationContext::new(Some("/srv/data"));
        assert!(ctx.has_declared_root());
        assert_eq!(ctx.base(), Path::new("/srv/data"));
    }

    #[test]
    fn diagnostic_display_prefixes_source_lines_only() {
        let mut diag = Diagnostic {
            rule: RuleKind::MixedSlashes,
            origin: Origin::SourceLine(7),
            path: "a/b\\c".to_string(),
            message: "Path 'a/b\\c' mixes slash styles".to_string(),
        };
        assert_eq!(diag.to_string(), "Line 7: Path 'a/b\\c' mixes slash styles");

        diag.origin = Origin::CommandLine;
        assert_eq!(diag.to_string(), "Path 'a/b\\c' mixes slash styles");
    }

    #[test]
    fn origin_line_accessor() {
        assert_eq!(Origin::CommandLine.line(), None);
        assert_eq!(Origin::SourceLine(3).line(), Some(3));
    }
}
