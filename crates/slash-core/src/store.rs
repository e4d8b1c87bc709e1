use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

use slash_crypto::{derive_key_pair, KeyPair};
use slash_types::{EncryptionKey, PublicKey};
use tracing::{debug, warn};

use crate::core::Core;
use crate::error::{CoreError, CoreResult};
use crate::replicate::{ReplicateOptions, ReplicationStream};
use crate::storage::CoreStorage;

/// How to open a log session.
///
/// Exactly one identity source is used, in priority order: an explicit
/// `key_pair`, a `name` (key pair derived from the storage root and
/// namespace), or a bare `key` (read-only).
#[derive(Clone, Debug, Default)]
pub struct CoreOptions {
    pub key: Option<PublicKey>,
    pub key_pair: Option<KeyPair>,
    pub name: Option<String>,
    pub encryption_key: Option<EncryptionKey>,
}

impl CoreOptions {
    /// Open (or create) the writable log called `name` in this namespace.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Open someone else's log by public key.
    pub fn from_key(key: PublicKey) -> Self {
        Self {
            key: Some(key),
            ..Self::default()
        }
    }

    /// Open the log owned by `key_pair`.
    pub fn from_key_pair(key_pair: KeyPair) -> Self {
        Self {
            key_pair: Some(key_pair),
            ..Self::default()
        }
    }

    /// Encrypt and decrypt blocks with `key`.
    pub fn encryption_key(mut self, key: Option<EncryptionKey>) -> Self {
        self.encryption_key = key;
        self
    }
}

/// A live link from one storage root to a peer.
pub(crate) struct Peer {
    pub(crate) connection: u64,
    pub(crate) remote: Weak<StoreInner>,
    pub(crate) live: bool,
}

pub(crate) struct StoreInner {
    primary_key: [u8; 32],
    cores: RwLock<HashMap<PublicKey, Arc<CoreStorage>>>,
    pub(crate) peers: RwLock<Vec<Peer>>,
}

impl StoreInner {
    fn storage(&self, key: &PublicKey) -> Arc<CoreStorage> {
        let mut cores = self.cores.write().expect("store lock poisoned");
        Arc::clone(
            cores
                .entry(*key)
                .or_insert_with(|| Arc::new(CoreStorage::new(*key))),
        )
    }

    /// Storage for `key`, only if some session already opened it here.
    fn opened(&self, key: &PublicKey) -> Option<Arc<CoreStorage>> {
        self.cores
            .read()
            .expect("store lock poisoned")
            .get(key)
            .cloned()
    }

    fn remotes(&self) -> Vec<(Arc<StoreInner>, bool)> {
        self.peers
            .read()
            .expect("peer lock poisoned")
            .iter()
            .filter_map(|peer| peer.remote.upgrade().map(|remote| (remote, peer.live)))
            .collect()
    }

    pub(crate) fn has_peers(&self) -> bool {
        !self.remotes().is_empty()
    }

    pub(crate) fn disconnect(&self, connection: u64) {
        self.peers
            .write()
            .expect("peer lock poisoned")
            .retain(|peer| peer.connection != connection);
    }

    /// Pull whatever the connected peers have beyond our local length of
    /// `local`. Returns `true` if anything was added.
    pub(crate) fn update_core(&self, local: &CoreStorage) -> bool {
        let mut added = 0;
        for (remote, _) in self.remotes() {
            added += self.pull_from(local, &remote);
        }
        if added > 0 {
            self.announce(local.key());
        }
        added > 0
    }

    /// Offer our newest blocks of `key` to every live peer that has the
    /// log open.
    pub(crate) fn announce(&self, key: &PublicKey) {
        for (remote, live) in self.remotes() {
            if !live {
                continue;
            }
            if let Some(theirs) = remote.opened(key) {
                if remote.pull_from(&theirs, self) > 0 {
                    remote.announce(key);
                }
            }
        }
    }

    fn pull_from(&self, local: &CoreStorage, remote: &StoreInner) -> u64 {
        let Some(theirs) = remote.opened(local.key()) else {
            return 0;
        };
        let start = local.len();
        let blocks = theirs.blocks_from(start);
        if blocks.is_empty() {
            return 0;
        }
        match local.append_verified(start, blocks) {
            Ok(added) => {
                debug!(key = %local.key().short_hex(), added, length = local.len(), "replicated blocks");
                added
            }
            Err(e) => {
                warn!(key = %local.key().short_hex(), error = %e, "rejected replicated blocks");
                0
            }
        }
    }
}

/// Storage root for append-only logs.
///
/// A `Corestore` hands out [`Core`] sessions. Sessions opened on the same
/// public key within one root share their blocks; [`Corestore::namespace`]
/// returns a view onto the same root in which named logs derive different
/// key pairs.
#[derive(Clone)]
pub struct Corestore {
    inner: Arc<StoreInner>,
    namespace: Vec<Vec<u8>>,
}

impl Corestore {
    /// Create an empty in-memory storage root with a random primary key.
    pub fn new() -> Self {
        let mut primary_key = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut primary_key);
        Self::with_primary_key(primary_key)
    }

    /// Create an empty storage root whose named logs derive from `primary_key`.
    pub fn with_primary_key(primary_key: [u8; 32]) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                primary_key,
                cores: RwLock::new(HashMap::new()),
                peers: RwLock::new(Vec::new()),
            }),
            namespace: Vec::new(),
        }
    }

    /// A child view whose named logs live under `name`.
    pub fn namespace(&self, name: impl AsRef<[u8]>) -> Self {
        let mut namespace = self.namespace.clone();
        namespace.push(name.as_ref().to_vec());
        Self {
            inner: Arc::clone(&self.inner),
            namespace,
        }
    }

    /// Open a session on a log.
    pub fn get(&self, options: CoreOptions) -> CoreResult<Core> {
        let key_pair = match (options.key_pair, &options.name) {
            (Some(key_pair), _) => Some(key_pair),
            (None, Some(name)) => Some(derive_key_pair(
                &self.inner.primary_key,
                &self.namespace,
                name,
            )),
            (None, None) => None,
        };
        let key = match (&key_pair, options.key) {
            (Some(pair), Some(key)) if pair.public_key() != key => {
                return Err(CoreError::KeyMismatch(key))
            }
            (Some(pair), _) => pair.public_key(),
            (None, Some(key)) => key,
            (None, None) => return Err(CoreError::MissingKey),
        };

        let storage = self.inner.storage(&key);
        Ok(Core::new(
            storage,
            Arc::clone(&self.inner),
            key_pair,
            options.encryption_key,
        ))
    }

    /// Start a replication stream for every log in this root.
    ///
    /// Pair it with a stream from another root using
    /// [`ReplicationStream::connect`]; exactly one side must be the initiator.
    pub fn replicate(&self, is_initiator: bool, options: ReplicateOptions) -> ReplicationStream {
        ReplicationStream::new(Arc::clone(&self.inner), is_initiator, options)
    }

    /// Number of logs opened in this root so far.
    pub fn len(&self) -> usize {
        self.inner.cores.read().expect("store lock poisoned").len()
    }

    /// Returns `true` if no log has been opened yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Corestore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Corestore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Corestore")
            .field("cores", &self.len())
            .field("namespace_depth", &self.namespace.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_logs_are_writable_and_stable() {
        let store = Corestore::new();
        let a = store.get(CoreOptions::named("content")).unwrap();
        let b = store.get(CoreOptions::named("content")).unwrap();
        assert!(a.writable());
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn namespaces_separate_named_logs() {
        let store = Corestore::new();
        let a = store.namespace("a").get(CoreOptions::named("content")).unwrap();
        let b = store.namespace("b").get(CoreOptions::named("content")).unwrap();
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn same_primary_key_derives_same_logs() {
        let a = Corestore::with_primary_key([5; 32]);
        let b = Corestore::with_primary_key([5; 32]);
        let ka = a.namespace("x").get(CoreOptions::named("n")).unwrap().key();
        let kb = b.namespace("x").get(CoreOptions::named("n")).unwrap().key();
        assert_eq!(ka, kb);
    }

    #[test]
    fn opening_by_key_is_read_only() {
        let store = Corestore::new();
        let owner = store.get(CoreOptions::named("log")).unwrap();
        let reader = store.get(CoreOptions::from_key(owner.key())).unwrap();
        assert!(!reader.writable());
        assert!(reader.readable());
    }

    #[test]
    fn missing_identity_is_rejected() {
        let store = Corestore::new();
        let err = store.get(CoreOptions::default()).unwrap_err();
        assert_eq!(err, CoreError::MissingKey);
    }

    #[test]
    fn mismatched_key_and_key_pair_are_rejected() {
        let store = Corestore::new();
        let options = CoreOptions {
            key: Some(PublicKey::from_bytes([1; 32])),
            key_pair: Some(KeyPair::generate()),
            ..CoreOptions::default()
        };
        assert!(matches!(store.get(options), Err(CoreError::KeyMismatch(_))));
    }

    #[tokio::test]
    async fn sessions_on_one_key_share_blocks() {
        let store = Corestore::new();
        let owner = store.get(CoreOptions::named("log")).unwrap();
        owner.append(&[b"hello"]).await.unwrap();

        let reader = store.get(CoreOptions::from_key(owner.key())).unwrap();
        assert_eq!(reader.len(), 1);
        assert_eq!(reader.get(0).await.unwrap().as_ref(), b"hello");
        assert_eq!(store.len(), 1);
    }
}
