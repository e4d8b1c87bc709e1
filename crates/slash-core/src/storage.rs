use std::sync::{Arc, RwLock};

use bytes::Bytes;
use slash_crypto::{verify, ContentHasher, KeyPair, Signature};
use slash_types::PublicKey;
use tokio::sync::watch;

use crate::error::{CoreError, CoreResult};
use crate::event::{AppendEvent, Listeners};

/// One committed block as held in storage: the (possibly encrypted) bytes
/// plus the owner's signature over them.
#[derive(Clone, Debug)]
pub(crate) struct StoredBlock {
    pub(crate) data: Bytes,
    /// Plaintext length, covered by the signature.
    pub(crate) byte_length: u64,
    pub(crate) signature: Signature,
}

impl StoredBlock {
    /// Sign `data` as block `index` of the log owned by `key_pair`.
    pub(crate) fn sign(key_pair: &KeyPair, index: u64, byte_length: u64, data: Bytes) -> Self {
        let digest = Self::digest(&key_pair.public_key(), index, byte_length, &data);
        Self {
            signature: key_pair.sign(&digest),
            data,
            byte_length,
        }
    }

    /// Check the signature against the log's public key.
    pub(crate) fn verify(&self, key: &PublicKey, index: u64) -> CoreResult<()> {
        let digest = Self::digest(key, index, self.byte_length, &self.data);
        verify(key, &digest, &self.signature)
            .map_err(|_| CoreError::InvalidSignature { key: *key, index })
    }

    fn digest(key: &PublicKey, index: u64, byte_length: u64, data: &[u8]) -> [u8; 32] {
        ContentHasher::BLOCK.hash_parts(&[
            key.as_bytes(),
            &index.to_le_bytes(),
            &byte_length.to_le_bytes(),
            data,
        ])
    }
}

#[derive(Default)]
struct LogState {
    blocks: Vec<StoredBlock>,
    byte_length: u64,
}

/// In-memory block storage for one log, shared by every session opened on
/// the same public key within a storage root.
///
/// Appends are serialized by the write lock, which is what gives each block
/// its index. Observers are notified after the lock is released.
pub(crate) struct CoreStorage {
    key: PublicKey,
    state: RwLock<LogState>,
    pub(crate) listeners: Arc<Listeners>,
    /// Number of outstanding `finding_peers` handles.
    pub(crate) finding_peers: watch::Sender<usize>,
}

impl CoreStorage {
    pub(crate) fn new(key: PublicKey) -> Self {
        let (finding_peers, _) = watch::channel(0);
        Self {
            key,
            state: RwLock::new(LogState::default()),
            listeners: Arc::new(Listeners::default()),
            finding_peers,
        }
    }

    pub(crate) fn key(&self) -> &PublicKey {
        &self.key
    }

    pub(crate) fn len(&self) -> u64 {
        self.state.read().expect("log lock poisoned").blocks.len() as u64
    }

    pub(crate) fn byte_len(&self) -> u64 {
        self.state.read().expect("log lock poisoned").byte_length
    }

    pub(crate) fn block(&self, index: u64) -> Option<StoredBlock> {
        let state = self.state.read().expect("log lock poisoned");
        usize::try_from(index)
            .ok()
            .and_then(|i| state.blocks.get(i))
            .cloned()
    }

    /// All blocks at or after `start`.
    pub(crate) fn blocks_from(&self, start: u64) -> Vec<StoredBlock> {
        let state = self.state.read().expect("log lock poisoned");
        let start = usize::try_from(start).unwrap_or(usize::MAX);
        state.blocks.get(start..).map(<[_]>::to_vec).unwrap_or_default()
    }

    /// Append locally produced blocks.
    ///
    /// `build` receives the index of the first new block and runs under the
    /// write lock, so no other append can claim the same indices. Either all
    /// of its blocks are committed or none are.
    pub(crate) fn append_with<F>(&self, build: F) -> CoreResult<AppendEvent>
    where
        F: FnOnce(u64) -> CoreResult<Vec<StoredBlock>>,
    {
        let event = {
            let mut state = self.state.write().expect("log lock poisoned");
            let start = state.blocks.len() as u64;
            let blocks = build(start)?;
            for block in blocks {
                state.byte_length += block.byte_length;
                state.blocks.push(block);
            }
            AppendEvent {
                key: self.key,
                length: state.blocks.len() as u64,
                byte_length: state.byte_length,
                remote: false,
            }
        };
        self.listeners.emit(&event);
        Ok(event)
    }

    /// Append blocks received from a peer, starting at index `start`.
    ///
    /// Every block is signature-checked before anything is committed. Blocks
    /// already present locally are skipped. Returns the number of blocks
    /// added.
    pub(crate) fn append_verified(&self, start: u64, blocks: Vec<StoredBlock>) -> CoreResult<u64> {
        for (offset, block) in blocks.iter().enumerate() {
            block.verify(&self.key, start + offset as u64)?;
        }

        let (added, event) = {
            let mut state = self.state.write().expect("log lock poisoned");
            let have = state.blocks.len() as u64;
            if have < start {
                // A gap would break the index of every later block.
                return Ok(0);
            }
            let skip = usize::try_from(have - start).unwrap_or(usize::MAX);
            let mut added = 0;
            for block in blocks.into_iter().skip(skip) {
                state.byte_length += block.byte_length;
                state.blocks.push(block);
                added += 1;
            }
            let event = AppendEvent {
                key: self.key,
                length: state.blocks.len() as u64,
                byte_length: state.byte_length,
                remote: true,
            };
            (added, event)
        };

        if added > 0 {
            self.listeners.emit(&event);
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed(pair: &KeyPair, index: u64, data: &'static [u8]) -> StoredBlock {
        StoredBlock::sign(pair, index, data.len() as u64, Bytes::from_static(data))
    }

    #[test]
    fn append_assigns_sequential_indices() {
        let pair = KeyPair::generate();
        let storage = CoreStorage::new(pair.public_key());

        let event = storage
            .append_with(|start| {
                assert_eq!(start, 0);
                Ok(vec![signed(&pair, 0, b"a"), signed(&pair, 1, b"bc")])
            })
            .unwrap();
        assert_eq!(event.length, 2);
        assert_eq!(event.byte_length, 3);
        assert!(!event.remote);

        storage
            .append_with(|start| {
                assert_eq!(start, 2);
                Ok(vec![signed(&pair, 2, b"d")])
            })
            .unwrap();
        assert_eq!(storage.len(), 3);
        assert_eq!(storage.block(2).unwrap().data.as_ref(), b"d");
        assert!(storage.block(3).is_none());
    }

    #[test]
    fn failed_build_commits_nothing() {
        let storage = CoreStorage::new(PublicKey::from_bytes([1; 32]));
        let err = storage.append_with(|_| Err(CoreError::Closed)).unwrap_err();
        assert_eq!(err, CoreError::Closed);
        assert_eq!(storage.len(), 0);
    }

    #[test]
    fn verified_append_rejects_forged_blocks() {
        let owner = KeyPair::generate();
        let forger = KeyPair::generate();
        let storage = CoreStorage::new(owner.public_key());

        let err = storage
            .append_verified(0, vec![signed(&forger, 0, b"evil")])
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidSignature { index: 0, .. }));
        assert_eq!(storage.len(), 0);
    }

    #[test]
    fn verified_append_rejects_blocks_signed_for_another_index() {
        let owner = KeyPair::generate();
        let storage = CoreStorage::new(owner.public_key());
        let err = storage
            .append_verified(0, vec![signed(&owner, 5, b"moved")])
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidSignature { .. }));
    }

    #[test]
    fn verified_append_skips_known_prefix() {
        let owner = KeyPair::generate();
        let storage = CoreStorage::new(owner.public_key());
        storage
            .append_with(|_| Ok(vec![signed(&owner, 0, b"a")]))
            .unwrap();

        let added = storage
            .append_verified(0, vec![signed(&owner, 0, b"a"), signed(&owner, 1, b"b")])
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(storage.len(), 2);
        assert_eq!(storage.byte_len(), 2);
    }

    #[test]
    fn blocks_from_past_end_is_empty() {
        let storage = CoreStorage::new(PublicKey::from_bytes([1; 32]));
        assert!(storage.blocks_from(10).is_empty());
    }
}
