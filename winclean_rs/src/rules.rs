//! Path validity rule engine.
//!
//! Rules run in a fixed order and the first failing rule wins, so each
//! candidate yields at most one [`Diagnostic`]. The order surfaces the most
//! actionable problem first: a UNC path that also contains `?` is reported
//! as UNC only.

use std::path::{Component, Path, PathBuf};

use crate::types::{Diagnostic, Origin, PathCandidate, RuleKind, ValidationContext};

/// Windows device names that cannot be used as file or folder names.
pub const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Characters Windows rejects inside path components.
pub const ILLEGAL_CHARS: [char; 7] = ['<', '>', ':', '"', '|', '?', '*'];

/// Everything a rule gets to look at.
struct Subject<'a> {
    raw: &'a str,
    trimmed: &'a str,
    origin: Origin,
    ctx: &'a ValidationContext,
}

struct Rule {
    kind: RuleKind,
    check: fn(&Subject<'_>) -> Option<String>,
}

const RULES: [Rule; 6] = [
    Rule {
        kind: RuleKind::UncWorkingDirectory,
        check: check_unc,
    },
    Rule {
        kind: RuleKind::IllegalCharacters,
        check: check_illegal_chars,
    },
    Rule {
        kind: RuleKind::MixedSlashes,
        check: check_mixed_slashes,
    },
    Rule {
        kind: RuleKind::MissingDriveLetter,
        check: check_drive_letter,
    },
    Rule {
        kind: RuleKind::ReservedDeviceName,
        check: check_reserved_name,
    },
    Rule {
        kind: RuleKind::MissingFolder,
        check: check_exists,
    },
];

/// Evaluate one raw path against every rule, stopping at the first failure.
pub fn evaluate(raw: &str, origin: Origin, ctx: &ValidationContext) -> Option<Diagnostic> {
    let subject = Subject {
        raw,
        trimmed: raw.trim(),
        origin,
        ctx,
    };
    RULES.iter().find_map(|rule| {
        (rule.check)(&subject).map(|message| Diagnostic {
            rule: rule.kind,
            origin,
            path: raw.to_string(),
            message,
        })
    })
}

/// Evaluate a batch of candidates, keeping discovery order.
pub fn evaluate_all(candidates: &[PathCandidate], ctx: &ValidationContext) -> Vec<Diagnostic> {
    candidates
        .iter()
        .filter_map(|c| evaluate(&c.raw, c.origin, ctx))
        .collect()
}

fn check_unc(s: &Subject<'_>) -> Option<String> {
    s.trimmed.starts_with("\\\\").then(|| {
        format!(
            "UNC path '{}' cannot be used as a current directory in Windows CMD",
            s.raw
        )
    })
}

fn check_illegal_chars(s: &Subject<'_>) -> Option<String> {
    // The colon of a leading drive designator (`C:`) is the one legal colon.
    let body = if has_drive_designator(s.trimmed) {
        &s.trimmed[2..]
    } else {
        s.trimmed
    };
    body.contains(ILLEGAL_CHARS)
        .then(|| format!("Path '{}' contains illegal Windows characters", s.raw))
}

fn check_mixed_slashes(s: &Subject<'_>) -> Option<String> {
    (s.trimmed.contains('/') && s.trimmed.contains('\\'))
        .then(|| format!("Path '{}' mixes slash styles", s.raw))
}

fn check_drive_letter(s: &Subject<'_>) -> Option<String> {
    let rooted =
        s.trimmed.starts_with('\\') || s.trimmed.starts_with('/') || s.trimmed.contains(':');
    // Relative commands may lean on a declared root; code-derived paths never do.
    let required = match s.origin {
        Origin::SourceLine(_) => true,
        Origin::CommandLine => !s.ctx.has_declared_root(),
    };
    (!rooted && required).then(|| format!("Path '{}' is missing a drive letter", s.raw))
}

fn check_reserved_name(s: &Subject<'_>) -> Option<String> {
    let base = final_segment(s.trimmed).to_ascii_uppercase();
    RESERVED_NAMES.contains(&base.as_str()).then(|| {
        format!(
            "Path '{}' uses reserved Windows device name '{base}'",
            s.raw
        )
    })
}

fn check_exists(s: &Subject<'_>) -> Option<String> {
    let full = resolve(s.ctx.base(), s.trimmed);
    if full.is_dir() {
        None
    } else {
        Some(format!("Folder does not exist -> {}", full.display()))
    }
}

/// `C:` style prefix: an ASCII letter followed by a colon.
fn has_drive_designator(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Last component after either slash style.
fn final_segment(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Join `path` onto `base`, anchor it at the working directory when still
/// relative, and fold `.`/`..` lexically.
pub fn resolve(base: &Path, path: &str) -> PathBuf {
    let joined = base.join(path);
    let absolute = if joined.is_absolute() {
        joined
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&joined))
            .unwrap_or(joined)
    };
    normalize_lexically(&absolute)
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root.
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
