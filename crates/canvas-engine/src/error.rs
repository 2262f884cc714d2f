//! Error types for the canvas engine

use thiserror::Error;

pub use crate::connect::ConnectionError;
pub use crate::groups::GroupError;
pub use crate::propagate::PropagationError;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Umbrella error for engine operations
///
/// Each operation also exposes its specific error type; this enum is
/// for hosts that funnel every engine call through one channel.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A proposed connection was rejected
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// A grouping operation failed
    #[error(transparent)]
    Group(#[from] GroupError),

    /// Gathering action inputs failed
    #[error(transparent)]
    Propagation(#[from] PropagationError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
