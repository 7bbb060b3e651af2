//! Candidate extraction.
//!
//! Three front ends feed the rule engine:
//! - [`structural`] - tree-sitter walk over Python source, literal arguments only
//! - [`lexical`] - quoted-string scan used when the source does not parse
//! - [`command`] - positional pick from a single `cd`-style command line

pub mod command;
mod compat;
pub mod lexical;
mod literal;
mod regexes;
pub mod structural;

pub use command::{extract_command, extract_path_from_command};
pub use lexical::extract_lines;
pub use structural::{ParseFailure, extract_structural};
