use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use slash_core::Core;
use tokio::sync::Mutex;
use tracing::debug;

use crate::blob::{BlobId, BlobsConfig};
use crate::error::{BlobError, BlobResult};

/// Whole-content blob store over one append-only log.
///
/// `put` splits content into blocks of at most `block_size` bytes and
/// appends them in one atomic write, so a returned [`BlobId`] always names
/// blocks that are already committed. `get` reassembles the blocks.
#[derive(Clone, Debug)]
pub struct Blobs {
    core: Core,
    config: BlobsConfig,
    write_lock: Arc<Mutex<()>>,
}

impl Blobs {
    /// Wrap a log session with the default configuration.
    pub fn new(core: Core) -> Self {
        Self {
            core,
            config: BlobsConfig::default(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Wrap a log session with an explicit configuration.
    pub fn with_config(core: Core, config: BlobsConfig) -> BlobResult<Self> {
        if config.block_size == 0 {
            return Err(BlobError::InvalidBlockSize(config.block_size));
        }
        Ok(Self {
            core,
            config,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// The underlying log session.
    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn config(&self) -> &BlobsConfig {
        &self.config
    }

    /// Wait for the content log to be locally operational.
    pub async fn ready(&self) -> BlobResult<()> {
        Ok(self.core.ready().await?)
    }

    /// Store `content` and return where it landed.
    pub async fn put(&self, content: &[u8]) -> BlobResult<BlobId> {
        let _guard = self.write_lock.lock().await;
        let chunks: Vec<&[u8]> = content.chunks(self.config.block_size).collect();
        // Offsets come from the committed event; other sessions may write
        // to the same log without taking this lock.
        let event = self.core.append_batch(&chunks).await?;
        let block_length = chunks.len() as u64;
        let byte_length = content.len() as u64;
        let id = BlobId {
            block_offset: event.length - block_length,
            block_length,
            byte_offset: event.byte_length - byte_length,
            byte_length,
        };
        debug!(key = %self.core.key().short_hex(), blob = %id, "blob stored");
        Ok(id)
    }

    /// Read back the content at `id`.
    ///
    /// Pulls from peers once if the blocks have not arrived yet; blocks
    /// still missing after that fail with the log's out-of-bounds error.
    pub async fn get(&self, id: &BlobId) -> BlobResult<Bytes> {
        if id.block_length == 0 {
            return Ok(Bytes::new());
        }
        if id.block_end() > self.core.len() {
            self.core.update().await?;
        }

        let mut content = BytesMut::with_capacity(id.byte_length as usize);
        for index in id.block_offset..id.block_end() {
            content.extend_from_slice(&self.core.get(index).await?);
        }
        if content.len() as u64 != id.byte_length {
            return Err(BlobError::LengthMismatch {
                id: *id,
                actual: content.len() as u64,
            });
        }
        Ok(content.freeze())
    }
}
