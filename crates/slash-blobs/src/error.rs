use slash_core::CoreError;

use crate::blob::BlobId;

/// Errors from blob store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobError {
    /// The underlying log failed.
    #[error("log error: {0}")]
    Core(#[from] CoreError),

    /// The blocks behind a blob id do not add up to its recorded length.
    #[error("blob {id} is {actual} bytes, expected {}", .id.byte_length)]
    LengthMismatch { id: BlobId, actual: u64 },

    /// Blocks must hold at least one byte.
    #[error("invalid block size: {0}")]
    InvalidBlockSize(usize),
}

/// Result alias for blob store operations.
pub type BlobResult<T> = Result<T, BlobError>;
