//! Error types for diff engine operations

use crate::cancel::Cancelled;
use thiserror::Error;

/// Result type for diff engine operations
pub type Result<T> = std::result::Result<T, BsDiffError>;

/// Errors that can occur while generating or applying a binary diff
#[derive(Error, Debug)]
pub enum BsDiffError {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cooperative cancellation was observed mid-operation
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    /// Corrupt patch payload
    #[error("corrupt patch data: {0}")]
    CorruptPatch(String),

    /// Applied patch did not produce the declared output size
    #[error("size mismatch: expected {expected} bytes, got {actual} bytes")]
    SizeMismatch { expected: usize, actual: usize },

    /// Input exceeds the addressable range of the engine
    #[error("input too large: {size} bytes exceeds the {max} byte limit")]
    InputTooLarge { size: u64, max: u64 },
}
