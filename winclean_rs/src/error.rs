//! User-facing failures. Rule violations are never errors; they are
//! [`Diagnostic`](crate::types::Diagnostic)s.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WincleanError {
    #[error("file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("{} is a directory, not a Python file", .0.display())]
    NotAFile(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("failed to create virtual environment: {0}")]
    Venv(String),

    #[error("Python executable not found at {}", .0.display())]
    InterpreterMissing(PathBuf),

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("process timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

pub type Result<T> = std::result::Result<T, WincleanError>;
