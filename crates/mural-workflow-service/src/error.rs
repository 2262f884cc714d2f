//! Error types for the workflow services

use thiserror::Error;

pub use crate::document::DocumentError;

/// Result type alias using ServiceError
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors that can occur in workflow persistence and auto-save
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The referenced workflow does not exist
    #[error("Workflow '{0}' not found")]
    WorkflowNotFound(String),

    /// An imported payload failed validation
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The persistence collaborator rejected a call
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
