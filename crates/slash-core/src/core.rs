use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use slash_crypto::{discovery_key, BlockCipher, KeyPair};
use slash_types::{DiscoveryKey, EncryptionKey, PublicKey};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::event::{AppendEvent, Subscription};
use crate::storage::{CoreStorage, StoredBlock};
use crate::store::StoreInner;

struct Session {
    storage: Arc<CoreStorage>,
    store: Arc<StoreInner>,
    key_pair: Option<KeyPair>,
    encryption_key: Option<EncryptionKey>,
    cipher: Option<BlockCipher>,
    discovery_key: DiscoveryKey,
    closed: AtomicBool,
}

/// A session on one append-only log.
///
/// Cloning a `Core` clones the handle, not the session: every clone sees
/// the same blocks and closing one closes them all. Sessions opened
/// separately on the same key share blocks but not encryption keys or
/// write capability.
#[derive(Clone)]
pub struct Core {
    inner: Arc<Session>,
}

impl Core {
    pub(crate) fn new(
        storage: Arc<CoreStorage>,
        store: Arc<StoreInner>,
        key_pair: Option<KeyPair>,
        encryption_key: Option<EncryptionKey>,
    ) -> Self {
        let key = *storage.key();
        let cipher = encryption_key
            .as_ref()
            .map(|ek| BlockCipher::new(ek, key));
        Self {
            inner: Arc::new(Session {
                discovery_key: discovery_key(&key),
                storage,
                store,
                key_pair,
                encryption_key,
                cipher,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Wait until the log is locally operational.
    pub async fn ready(&self) -> CoreResult<()> {
        self.check_open()
    }

    /// Fetch newer blocks from connected peers.
    ///
    /// Waits while any [`FindingPeers`] handle is outstanding, then pulls
    /// from every connected peer. Returns `true` if the log grew. With no
    /// peers this returns `false` rather than failing.
    pub async fn update(&self) -> CoreResult<bool> {
        self.check_open()?;
        let mut pending = self.inner.storage.finding_peers.subscribe();
        pending
            .wait_for(|outstanding| *outstanding == 0)
            .await
            .map_err(|_| CoreError::Closed)?;

        let before = self.len();
        let updated = self.inner.store.update_core(&self.inner.storage);
        debug!(
            key = %self.key().short_hex(),
            before,
            after = self.len(),
            peers = self.inner.store.has_peers(),
            "log update"
        );
        Ok(updated)
    }

    /// Atomically append `blocks`. Returns the new length of the log.
    pub async fn append<B: AsRef<[u8]>>(&self, blocks: &[B]) -> CoreResult<u64> {
        Ok(self.append_batch(blocks).await?.length)
    }

    /// Like [`Core::append`], but returns the log's length and byte length
    /// as committed by this write. Concurrent writers on the same log cannot
    /// interleave between the two.
    pub async fn append_batch<B: AsRef<[u8]>>(&self, blocks: &[B]) -> CoreResult<AppendEvent> {
        self.check_open()?;
        let key_pair = self
            .inner
            .key_pair
            .as_ref()
            .ok_or_else(|| CoreError::NotWritable(self.key()))?;
        if blocks.is_empty() {
            return Ok(AppendEvent {
                key: self.key(),
                length: self.len(),
                byte_length: self.byte_len(),
                remote: false,
            });
        }

        let event = self.inner.storage.append_with(|start| {
            blocks
                .iter()
                .enumerate()
                .map(|(offset, block)| -> CoreResult<StoredBlock> {
                    let index = start + offset as u64;
                    let plain = block.as_ref();
                    let data = match &self.inner.cipher {
                        Some(cipher) => Bytes::from(cipher.encrypt(index, plain)?),
                        None => Bytes::copy_from_slice(plain),
                    };
                    Ok(StoredBlock::sign(key_pair, index, plain.len() as u64, data))
                })
                .collect()
        })?;

        debug!(key = %self.key().short_hex(), length = event.length, "appended");
        self.inner.store.announce(&event.key);
        Ok(event)
    }

    /// Read and decrypt block `index`.
    pub async fn get(&self, index: u64) -> CoreResult<Bytes> {
        let raw = self.get_raw(index).await?;
        match &self.inner.cipher {
            Some(cipher) => Ok(Bytes::from(cipher.decrypt(index, &raw)?)),
            None => Ok(raw),
        }
    }

    /// Read block `index` exactly as stored, without decrypting it.
    pub async fn get_raw(&self, index: u64) -> CoreResult<Bytes> {
        self.check_open()?;
        self.inner
            .storage
            .block(index)
            .map(|block| block.data)
            .ok_or(CoreError::OutOfBounds {
                index,
                length: self.len(),
            })
    }

    /// Number of committed blocks.
    pub fn len(&self) -> u64 {
        self.inner.storage.len()
    }

    /// Returns `true` if no block has been committed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total plaintext bytes across all committed blocks.
    pub fn byte_len(&self) -> u64 {
        self.inner.storage.byte_len()
    }

    /// The log's public key.
    pub fn key(&self) -> PublicKey {
        *self.inner.storage.key()
    }

    /// The key this log is announced under.
    pub fn discovery_key(&self) -> DiscoveryKey {
        self.inner.discovery_key
    }

    /// The key this session encrypts blocks with, if any.
    pub fn encryption_key(&self) -> Option<&EncryptionKey> {
        self.inner.encryption_key.as_ref()
    }

    /// Whether this session can append.
    pub fn writable(&self) -> bool {
        self.inner.key_pair.is_some() && !self.is_closed()
    }

    /// Whether this session can read.
    pub fn readable(&self) -> bool {
        !self.is_closed()
    }

    /// Call `callback` after every committed append, local or replicated.
    pub fn on_append<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AppendEvent) + Send + Sync + 'static,
    {
        self.inner.storage.listeners.subscribe(Arc::new(callback))
    }

    /// Signal that peer discovery is in progress.
    ///
    /// [`Core::update`] waits until the returned handle is released with
    /// [`FindingPeers::done`] or dropped.
    pub fn finding_peers(&self) -> FindingPeers {
        self.inner
            .storage
            .finding_peers
            .send_modify(|outstanding| *outstanding += 1);
        FindingPeers {
            storage: Some(Arc::clone(&self.inner.storage)),
        }
    }

    /// Close the session. Later reads and writes fail with
    /// [`CoreError::Closed`].
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            debug!(key = %self.key().short_hex(), "session closed");
        }
    }

    /// Whether [`Core::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn check_open(&self) -> CoreResult<()> {
        if self.is_closed() {
            return Err(CoreError::Closed);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Core {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Core")
            .field("key", &self.key())
            .field("length", &self.len())
            .field("writable", &self.writable())
            .field("encrypted", &self.inner.cipher.is_some())
            .finish()
    }
}

/// Outstanding peer discovery on a log. Release it with [`FindingPeers::done`].
#[must_use = "dropping FindingPeers marks discovery as done immediately"]
pub struct FindingPeers {
    storage: Option<Arc<CoreStorage>>,
}

impl FindingPeers {
    /// Mark peer discovery as finished.
    pub fn done(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(storage) = self.storage.take() {
            storage
                .finding_peers
                .send_modify(|outstanding| *outstanding = outstanding.saturating_sub(1));
        }
    }
}

impl Drop for FindingPeers {
    fn drop(&mut self) {
        self.release();
    }
}
