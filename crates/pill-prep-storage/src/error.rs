//! Storage errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the storage smoke test. None of them are retried.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Client configuration is unusable.
    #[error("invalid storage configuration: {0}")]
    Config(String),

    /// Request could not be sent or its response not read.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Service answered with a non-success status.
    #[error("{operation} failed with HTTP {status}: {message}")]
    Http {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// Response body did not have the expected shape.
    #[error("unexpected response from {operation}: {message}")]
    Response {
        operation: &'static str,
        message: String,
    },

    /// Read-back found no metadata rows.
    #[error("no capture rows found for {kcode} after insert")]
    NotFound { kcode: String },

    #[error("failed to encode test image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;
