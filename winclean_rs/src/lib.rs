//! # winclean
//!
//! **Windows path pre-flight linter** - finds paths that will not work on a
//! Windows host before the code ever runs there.
//!
//! Input is either a Python script or a single `cd`-style command line.
//! Every path candidate is checked against six rules, in order, and the first
//! failing rule is reported:
//!
//! 1. UNC path used as a working directory (`\\server\share`)
//! 2. Illegal characters (`< > : " | ? *`, the drive colon excepted)
//! 3. Mixed slash styles
//! 4. Missing drive letter
//! 5. Reserved device name (`CON`, `NUL`, `COM1`, ...)
//! 6. Folder does not exist (checked on the current host)
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,no_run
//! use winclean::{ValidationContext, analyze};
//!
//! let ctx = ValidationContext::new(Some(r"C:\projects"));
//! let analysis = analyze(r"cd \\server\share", &ctx).unwrap();
//! for diag in &analysis.diagnostics {
//!     println!("{diag}");
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! winclean scripts/job.py                 # structural scan of a script
//! winclean "cd C:\Users" --root C:\       # validate one command
//! winclean job.py --mode dynamic --venv .venv
//! ```

// ============================================================================
// Core Modules
// ============================================================================

/// The path rule engine and its fixed rule order.
pub mod rules;

/// Candidate extraction from Python source and command lines.
///
/// - [`extract::structural`] - tree-sitter scan of `listdir`/`iterdir` calls
/// - [`extract::lexical`] - quoted-literal fallback for unparsable sources
/// - [`extract::command`] - path argument of a command line
pub mod extract;

/// Input routing and aggregation of diagnostics.
pub mod driver;

/// Sandboxed script execution for `--mode dynamic`.
pub mod dynamic;

/// Common types used throughout the crate.
pub mod types;

pub mod error;

// ============================================================================
// Front End
// ============================================================================

pub mod cli;
pub mod colors;

/// Optional `.winclean/config.toml`.
pub mod config;

pub mod output;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use driver::{Analysis, analyze, analyze_command, analyze_source, analyze_source_file};
pub use error::{Result, WincleanError};
pub use extract::extract_path_from_command;
pub use rules::evaluate;
pub use types::{Diagnostic, Origin, PathCandidate, RuleKind, ValidationContext};
