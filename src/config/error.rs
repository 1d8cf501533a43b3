//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port value is outside valid range (1-65535).
    #[error("invalid port '{value}': must be between 1 and 65535")]
    InvalidPort { value: String },

    /// Port string could not be parsed as a number.
    #[error("failed to parse port '{value}': {source}")]
    PortParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Bind address string could not be parsed.
    #[error("failed to parse bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// Batch limit must be a positive integer.
    #[error("invalid max batch size '{value}': must be a positive integer")]
    InvalidMaxBatch { value: String },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a file (when a file was expected).
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A config or baseline file could not be read.
    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config or baseline file is not valid JSON for its schema.
    #[error("failed to parse {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The requested model id is not declared under `models`.
    #[error("unknown model '{id}' (available: {available:?})")]
    UnknownModel { id: String, available: Vec<String> },

    /// A model declares neither `baseline_values` nor `baseline_values_path`.
    #[error("model '{model}' has no baseline_values or baseline_values_path")]
    NoBaselineSource { model: String },

    /// The model file is well-formed JSON but semantically unusable.
    #[error("invalid model config: {reason}")]
    InvalidModelConfig { reason: String },
}
