//! # Error Types for the witness calculator protocol

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    // Guest memory errors
    #[error("Guest memory out of bounds: offset {offset:#x}, length {len}, memory size {size}")]
    OutOfBounds { offset: usize, len: usize, size: usize },

    // Input errors
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Field errors
    #[error("Value {value} cannot be encoded: {reason}")]
    EncodingRange { value: String, reason: String },

    #[error("Invalid prime: {0}")]
    InvalidPrime(String),
}

impl SpecError {
    /// Check if this error reflects an internal invariant violation rather
    /// than bad caller input
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            SpecError::EncodingRange { .. } | SpecError::OutOfBounds { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SpecError>;
