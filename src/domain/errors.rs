//! Domain errors for the Yunmeng simulation.

use thiserror::Error;

/// Domain-level errors that can occur in the simulation.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Model reply was not the expected shape: {0}")]
    MalformedModelReply(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
