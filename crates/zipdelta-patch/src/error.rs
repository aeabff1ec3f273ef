//! Error types for patch generation

use thiserror::Error;
use zipdelta_bsdiff::{BsDiffError, Cancelled};
use zipdelta_zip::ZipError;

/// Result type for patch generation operations
pub type Result<T> = std::result::Result<T, PatchError>;

/// Errors that can occur while planning or writing an archive patch
#[derive(Error, Debug)]
pub enum PatchError {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cooperative cancellation was observed mid-operation
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    /// Diff engine failure
    #[error("diff engine error: {0}")]
    Diff(BsDiffError),

    /// Entry model failure
    #[error("zip entry error: {0}")]
    Zip(#[from] ZipError),

    /// Malformed plan: ordering violation, unresolved metadata, or a range
    /// outside the input
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
}

impl From<BsDiffError> for PatchError {
    fn from(err: BsDiffError) -> Self {
        // Keep cancellation a distinct kind so callers can tell "stopped
        // on purpose" from "failed", no matter which layer observed it.
        match err {
            BsDiffError::Cancelled(cancelled) => Self::Cancelled(cancelled),
            other => Self::Diff(other),
        }
    }
}
