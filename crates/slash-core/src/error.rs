use slash_crypto::CipherError;
use slash_types::PublicKey;

/// Errors produced by log operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("block {index} is out of bounds for log of length {length}")]
    OutOfBounds { index: u64, length: u64 },

    #[error("log {0:?} is not writable")]
    NotWritable(PublicKey),

    #[error("log session is closed")]
    Closed,

    #[error("a log needs a key, a key pair, or a name to be opened")]
    MissingKey,

    #[error("key pair does not match the requested key {0:?}")]
    KeyMismatch(PublicKey),

    #[error("block {index} of {key:?} has an invalid signature")]
    InvalidSignature { key: PublicKey, index: u64 },

    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error("replication error: {0}")]
    Replication(#[from] ReplicationError),
}

/// Errors produced when wiring two storage roots together.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplicationError {
    #[error("both ends of a replication stream have the same role")]
    SameRole,

    #[error("a storage root cannot replicate with itself")]
    SameStore,

    #[error("replication stream is already connected")]
    AlreadyConnected,
}

/// Result alias for log operations.
pub type CoreResult<T> = Result<T, CoreError>;
