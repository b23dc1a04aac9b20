//! Result and error types for Pruner.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Pruner operations
pub type PrunerResult<T> = Result<T, PrunerError>;

/// Errors that can occur in Pruner
#[derive(Debug, Error)]
pub enum PrunerError {
    /// The working directory is not inside a git work tree
    #[error("Pruner requires that the current directory is in GIT")]
    NotInRepository,

    /// A git command failed
    #[error("git failed: {message}")]
    Git {
        /// Error message
        message: String,
    },

    /// Persisted state exists but could not be decoded
    #[error("State file {} is corrupt: {source}", path.display())]
    StateCorrupt {
        /// Path of the state document
        path: PathBuf,
        /// Decoder error
        source: serde_json::Error,
    },

    /// Settings document missing, malformed or inconsistent
    #[error("Settings error: {message}")]
    Settings {
        /// Error message
        message: String,
    },

    /// No provider registered under this name
    #[error("Unknown test provider: {0}")]
    UnknownProvider(String),

    /// An external program could not be started
    #[error("Failed to execute {program}: {source}")]
    ProcessSpawn {
        /// Program that failed to spawn
        program: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// A coverage report could not be located or read
    #[error("Coverage report {}: {message}", path.display())]
    CoverageReport {
        /// Path of the report
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PrunerError {
    /// Create a git error
    #[must_use]
    pub fn git(message: impl Into<String>) -> Self {
        Self::Git {
            message: message.into(),
        }
    }

    /// Create a settings error
    #[must_use]
    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings {
            message: message.into(),
        }
    }

    /// Create a coverage report error
    #[must_use]
    pub fn coverage_report(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CoverageReport {
            path: path.into(),
            message: message.into(),
        }
    }
}
