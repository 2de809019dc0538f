//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for malformed values entering the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RollcallError {
    #[error("invalid student id: {0}")]
    InvalidStudentId(String),

    #[error("invalid session key: {0}")]
    InvalidSessionKey(String),

    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("invalid verification parameters: {0}")]
    InvalidParams(String),

    #[error("randomness source failed: {0}")]
    Randomness(String),
}
