//! Error types for loading, bundling and writing documents.
//!
//! Wraps filesystem and serialization failures together with the engine's
//! [`BundleError`] so callers deal with a single error type.

use schema_bundle_core::BundleError;
use thiserror::Error;

/// Errors that can occur around a bundle run.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The merge engine rejected the document.
    #[error(transparent)]
    Bundle(#[from] BundleError),

    /// The HTTP client could not be built.
    #[cfg(feature = "remote")]
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unknown output format name.
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),
}

/// Convenience alias for results with [`IoError`].
pub type Result<T> = std::result::Result<T, IoError>;
