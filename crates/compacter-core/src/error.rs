//! Error types for compacter.
//!
//! The compression policy and the suggestion engine are total and never
//! produce these. They belong to the orchestration layer: stores, jobs and
//! the collaborators those call into.

use thiserror::Error;

/// Result type alias using compacter's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for compacter operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected input (bad URI scheme, output path escaping its directory)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not enough resources to run (free storage)
    #[error("Resource error: {0}")]
    Resource(String),

    /// Transcoding backend failed; the message carries the underlying cause
    #[error("Execution error: {0}")]
    Execution(String),

    /// Durable store operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Lookup by id found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short category name, used as the `error_kind` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::Resource(_) => "resource",
            Error::Execution(_) => "execution",
            Error::Storage(_) => "storage",
            Error::Serialization(_) => "serialization",
            Error::NotFound(_) => "not_found",
            Error::Internal(_) => "internal",
            Error::Io(_) => "io",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
