use std::sync::Arc;

use bytes::Bytes;
use slash_bee::{Bee, RangeOptions};
use slash_blobs::Blobs;
use slash_core::{
    AppendEvent, CoreOptions, Corestore, FindingPeers, ReplicateOptions, ReplicationStream,
    Subscription,
};
use slash_crypto::derive_encryption_key;
use slash_types::{DiscoveryKey, EncryptionKey, PublicKey};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::DriveConfig;
use crate::error::{DriveError, DriveResult};
use crate::header::{DriveHeader, HEADER_CONTENT, HEADER_NAMESPACE, HEADER_SEMVER, OBJECT_NAMESPACE};
use crate::options::DriveOptions;
use crate::record::{ListEntry, Metadata, ObjectRecord};
use crate::resolver;

/// Name of the owner's content log inside the drive's storage namespace.
const CONTENT_LOG: &str = "content";

pub(crate) struct DriveInner {
    pub(crate) store: Corestore,
    pub(crate) config: DriveConfig,
    pub(crate) db: Bee,
    pub(crate) headers: Bee,
    objects: Bee,
    /// Empty until attached. Owners attach at open; replicas on first resolve.
    content: OnceCell<Blobs>,
    bootstrapped: OnceCell<()>,
}

/// A replicated object store: an ordered index whose values point into a
/// blob log.
///
/// The owner (holding the index key pair) writes; anyone with the public
/// key can open a replica, which finds the content log through the index
/// header on first `update`, `get` or `list`. Clones share one drive.
#[derive(Clone)]
pub struct Drive {
    inner: Arc<DriveInner>,
}

impl Drive {
    /// Open a drive in `store`. Nothing is read or written until first use.
    pub fn open(store: &Corestore, options: DriveOptions) -> DriveResult<Self> {
        let DriveOptions {
            key,
            key_pair,
            encrypted,
            encryption_key,
            config,
        } = options;

        let public_key = match (&key_pair, key) {
            (Some(pair), _) => pair.public_key(),
            (None, Some(key)) => key,
            (None, None) => return Err(DriveError::MissingIdentity),
        };
        let encryption_key = match (&key_pair, encryption_key) {
            (_, Some(supplied)) => Some(supplied),
            (Some(pair), None) if encrypted => Some(derive_encryption_key(pair)),
            _ => None,
        };

        let store = store.namespace(public_key.as_bytes());
        let is_owner = key_pair.is_some();
        let index = store.get(CoreOptions {
            key,
            key_pair,
            name: None,
            encryption_key: encryption_key.clone(),
        })?;

        let content = if is_owner {
            let core = store.get(CoreOptions::named(CONTENT_LOG).encryption_key(encryption_key))?;
            OnceCell::new_with(Some(Blobs::with_config(core, config.blobs())?))
        } else {
            OnceCell::new()
        };

        let db = Bee::new(index);
        debug!(drive = %public_key.short_hex(), owner = is_owner, "drive opened");
        Ok(Self {
            inner: Arc::new(DriveInner {
                headers: db.sub(HEADER_NAMESPACE),
                objects: db.sub(OBJECT_NAMESPACE),
                db,
                store,
                config,
                content,
                bootstrapped: OnceCell::new(),
            }),
        })
    }

    /// Wait for the logs and, on a fresh writable drive, write the header.
    ///
    /// Concurrent callers share one bootstrap; calls after it succeeded
    /// return at once.
    pub async fn ready(&self) -> DriveResult<()> {
        self.inner
            .bootstrapped
            .get_or_try_init(|| self.bootstrap())
            .await?;
        Ok(())
    }

    async fn bootstrap(&self) -> DriveResult<()> {
        let inner = &self.inner;
        inner.db.ready().await?;
        let Some(content) = inner.content.get() else {
            return Ok(());
        };
        content.ready().await?;

        if !self.writable() || inner.headers.get(HEADER_CONTENT).await?.is_some() {
            return Ok(());
        }
        let content_key = content.core().key();
        let mut batch = inner.headers.batch();
        batch
            .put(HEADER_CONTENT, content_key.as_bytes())
            .put(HEADER_SEMVER, inner.config.protocol_version.as_bytes());
        batch.flush().await?;

        info!(
            drive = %self.key().short_hex(),
            content = %content_key.short_hex(),
            version = %inner.config.protocol_version,
            "drive header written"
        );
        Ok(())
    }

    /// The attached content log, resolving it from the header first if needed.
    async fn content(&self) -> DriveResult<&Blobs> {
        self.inner
            .content
            .get_or_try_init(|| resolver::resolve(&self.inner))
            .await
    }

    /// Pull from peers. Returns `true` if the index grew.
    ///
    /// Bootstraps the drive first, as [`Drive::ready`] does, so a fresh
    /// owner's header counts as growth. A replica without a content log
    /// resolves it here, failing with [`DriveError::UnresolvedDrive`] while
    /// the header is out of reach.
    pub async fn update(&self) -> DriveResult<bool> {
        let before = self.version();
        self.ready().await?;
        match self.inner.content.get() {
            Some(content) => {
                self.inner.db.core().update().await?;
                content.core().update().await?;
            }
            None => {
                self.content().await?;
            }
        }
        Ok(self.version() > before)
    }

    /// Store `content` at `key`, replacing any previous object.
    ///
    /// The bytes are committed to the content log before the index entry
    /// pointing at them is written.
    pub async fn put(
        &self,
        key: &str,
        content: &[u8],
        metadata: Option<&Metadata>,
    ) -> DriveResult<()> {
        self.ready().await?;
        if !self.writable() {
            return Err(DriveError::NotWritable);
        }
        let blobs = self.inner.content.get().ok_or(DriveError::NotWritable)?;

        let blob_index = blobs.put(content).await?;
        let record = ObjectRecord::new(key, blob_index, metadata)?;
        self.inner.objects.put(key, record.encode(key)?).await?;
        debug!(key, blob = %blob_index, "object stored");
        Ok(())
    }

    /// The bytes stored at `key`, or `None` if there is no such object.
    pub async fn get(&self, key: &str) -> DriveResult<Option<Bytes>> {
        let content = self.content().await?;
        let Some(node) = self.inner.objects.get(key).await? else {
            return Ok(None);
        };
        let record = ObjectRecord::decode(key, &node.value)?;
        Ok(Some(content.get(&record.blob_index).await?))
    }

    /// Objects whose key starts with `prefix`, in key order.
    ///
    /// Scans `[prefix, prefix + "~")`, so keys continuing past `~` (or with
    /// non-ASCII bytes right after the prefix) are not listed.
    pub async fn list(&self, prefix: &str) -> DriveResult<Vec<ListEntry>> {
        self.content().await?;
        let nodes = self
            .inner
            .objects
            .range(RangeOptions::between(prefix, format!("{prefix}~")))
            .await?;

        nodes
            .into_iter()
            .map(|node| {
                let key = String::from_utf8_lossy(&node.key).into_owned();
                let record = ObjectRecord::decode(&key, &node.value)?;
                Ok(ListEntry {
                    metadata: record.metadata(&key)?,
                    key,
                })
            })
            .collect()
    }

    /// The header entries, if written. The stored version is reported, not
    /// enforced.
    pub async fn header(&self) -> DriveResult<Option<DriveHeader>> {
        let header = resolver::read_header(&self.inner.db, &self.inner.headers).await?;
        if let Some(header) = &header {
            resolver::warn_on_version(header, &self.inner.config.protocol_version);
        }
        Ok(header)
    }

    /// Mark peer discovery as in progress; `update` waits until released.
    pub fn finding_peers(&self) -> FindingPeers {
        self.inner.db.core().finding_peers()
    }

    /// Replicate every log in this drive's storage root.
    pub fn replicate(&self, is_initiator: bool, options: ReplicateOptions) -> ReplicationStream {
        self.inner.store.replicate(is_initiator, options)
    }

    /// Call `callback` whenever the index log grows.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AppendEvent) + Send + Sync + 'static,
    {
        self.inner.db.core().on_append(callback)
    }

    /// The index log's public key.
    pub fn key(&self) -> PublicKey {
        self.inner.db.core().key()
    }

    pub fn discovery_key(&self) -> DiscoveryKey {
        self.inner.db.core().discovery_key()
    }

    pub fn encryption_key(&self) -> Option<&EncryptionKey> {
        self.inner.db.core().encryption_key()
    }

    /// The content log's public key, once attached.
    pub fn content_key(&self) -> Option<PublicKey> {
        self.inner.content.get().map(|c| c.core().key())
    }

    /// Both logs are writable. False for replicas.
    pub fn writable(&self) -> bool {
        self.inner.db.core().writable()
            && self
                .inner
                .content
                .get()
                .is_some_and(|c| c.core().writable())
    }

    /// Both logs are readable. False until a replica has resolved.
    pub fn readable(&self) -> bool {
        self.inner.db.core().readable()
            && self
                .inner
                .content
                .get()
                .is_some_and(|c| c.core().readable())
    }

    /// Length of the index log.
    pub fn version(&self) -> u64 {
        self.inner.db.version()
    }

    pub fn config(&self) -> &DriveConfig {
        &self.inner.config
    }

    /// Release both logs. Later reads and writes fail.
    pub fn close(&self) {
        self.inner.db.core().close();
        if let Some(content) = self.inner.content.get() {
            content.core().close();
        }
        debug!(drive = %self.key().short_hex(), "drive closed");
    }
}

impl std::fmt::Debug for Drive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Drive")
            .field("key", &self.key())
            .field("content", &self.content_key())
            .field("version", &self.version())
            .field("writable", &self.writable())
            .finish()
    }
}
