//! Error types for the ZIP entry model

use thiserror::Error;

/// Result type for ZIP entry operations
pub type Result<T> = std::result::Result<T, ZipError>;

/// Errors that can occur while modeling ZIP entries
#[derive(Error, Debug)]
pub enum ZipError {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Deflate level/strategy/wrap combination outside the valid space
    #[error("invalid deflate parameters: level={level}, strategy={strategy}")]
    InvalidDeflateParameters { level: u8, strategy: u8 },

    /// Deflate parameter id outside the canonical 1..=54 range
    #[error("invalid deflate parameter id: {0}")]
    InvalidDeflateParameterId(u8),

    /// Textual parameter form that does not parse
    #[error("malformed deflate parameter string: {0}")]
    MalformedParameterString(String),
}
