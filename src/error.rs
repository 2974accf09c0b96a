//! Error types for the mock engine

use std::io;
use thiserror::Error;

/// Result type for internal mock engine operations
pub type Result<T> = std::result::Result<T, MockError>;

/// Errors raised below the `WorkingService` boundary
///
/// The service itself never returns these; they are logged and folded into
/// `false` or the empty sentinel.
#[derive(Debug, Error)]
pub enum MockError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid record log format
    #[error("Invalid record log format: {0}")]
    InvalidFormat(String),

    /// Record log corrupted (CRC mismatch)
    #[error("Record log corrupted at offset {offset}: expected CRC {expected:#x}, got {actual:#x}")]
    CorruptedData {
        /// Offset where corruption was detected
        offset: u64,
        /// Expected CRC32 value
        expected: u32,
        /// Actual CRC32 value
        actual: u32,
    },

    /// Payload could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Payload too large
    #[error("Data too large: {size} bytes exceeds limit of {limit} bytes")]
    DataTooLarge {
        /// Actual size
        size: usize,
        /// Size limit
        limit: usize,
    },

    /// Category name not in the closed category set
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}
