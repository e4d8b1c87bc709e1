use slash_bee::BeeError;
use slash_blobs::BlobError;
use slash_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriveError {
    /// Neither a public key nor a key pair was supplied.
    #[error("drive needs a public key or a key pair")]
    MissingIdentity,

    /// Write attempted on a read-only drive or one without a content log.
    #[error("drive is not writable")]
    NotWritable,

    /// The index log has not replicated far enough to hold a header.
    #[error("cannot resolve drive: index log has {length} blocks, need at least 2")]
    UnresolvedDrive { length: u64 },

    /// The header exists but names no content log.
    #[error("drive header has no content key")]
    MissingContentKey,

    /// The header cannot be read: wrong encryption key or corrupt log.
    #[error("drive header unreadable (encrypted or corrupt): {reason}; header block: {}", render_block(.header_block))]
    CorruptOrEncryptedDrive {
        reason: String,
        header_block: Option<Vec<u8>>,
    },

    #[error("object record for {key:?} is malformed: {reason}")]
    Record { key: String, reason: String },

    #[error("invalid drive config: {0}")]
    Config(String),

    #[error("log error: {0}")]
    Core(#[from] CoreError),

    #[error("index error: {0}")]
    Bee(#[from] BeeError),

    #[error("blob error: {0}")]
    Blobs(#[from] BlobError),
}

fn render_block(block: &Option<Vec<u8>>) -> String {
    match block {
        Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        None => "<unavailable>".into(),
    }
}

pub type DriveResult<T> = Result<T, DriveError>;
