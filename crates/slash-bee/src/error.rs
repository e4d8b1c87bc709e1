//! Error types for index operations.

use slash_core::CoreError;
use thiserror::Error;

/// Errors that can occur during index operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BeeError {
    /// The underlying log failed (closed, not writable, cannot decrypt...).
    #[error("log error: {0}")]
    Core(#[from] CoreError),

    /// A committed block could not be decoded as an index block.
    #[error("cannot decode index block {seq}: {reason}")]
    Decode { seq: u64, reason: String },

    /// An entry could not be encoded.
    #[error("cannot encode index block: {0}")]
    Encode(String),
}

/// Convenience type alias for index operations.
pub type BeeResult<T> = std::result::Result<T, BeeError>;
