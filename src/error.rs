//! Error types for mcportscan.
//!
//! Uses `thiserror` for ergonomic error definitions. Probe errors are
//! per-port and never escape the batch scheduler; sink and run errors are
//! fatal; configuration errors are recovered by falling back to defaults.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::TargetError;

/// Why a single status probe produced no result.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("connection timed out")]
    Timeout,

    #[error("connection refused")]
    ConnectionRefused,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid status JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Failure to append results to the output artifact. Always fatal.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to write results: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode result row: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Configuration problems. These are resolved before scanning begins.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {field} '{value}': {reason}")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read config file {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid config format: {0}")]
    InvalidFormat(String),

    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Shorthand for an invalid value error.
    pub fn invalid(field: &'static str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that abort a whole run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("cannot resolve target: {0}")]
    Target(#[from] TargetError),

    #[error("failed to prepare output file {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for run operations.
pub type RunResult<T> = Result<T, RunError>;
