use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use bytes::Bytes;
use slash_core::Core;
use tokio::sync::Mutex;
use tracing::debug;

use crate::batch::Batch;
use crate::error::{BeeError, BeeResult};
use crate::node::{Block, Header, Node};

/// Separator between a namespace label and the keys inside it.
pub const SUB_SEPARATOR: u8 = 0x00;

/// Bounds and ordering for [`Bee::range`]. Bounds are relative to the
/// namespace the scan runs in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RangeOptions {
    pub gt: Option<Vec<u8>>,
    pub gte: Option<Vec<u8>>,
    pub lt: Option<Vec<u8>>,
    pub lte: Option<Vec<u8>>,
    pub reverse: bool,
    pub limit: Option<usize>,
}

impl RangeOptions {
    /// The half-open range `[gte, lt)`.
    pub fn between(gte: impl Into<Vec<u8>>, lt: impl Into<Vec<u8>>) -> Self {
        Self {
            gte: Some(gte.into()),
            lt: Some(lt.into()),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug)]
struct Stored {
    seq: u64,
    value: Bytes,
}

/// Materialized view of the log up to `length` blocks.
#[derive(Default)]
struct Snapshot {
    length: u64,
    entries: BTreeMap<Vec<u8>, Stored>,
}

/// Ordered key-value index stored in an append-only log.
///
/// Every mutation is one block; block 0 is the index header. Reads fold the
/// committed blocks into an ordered map, extended incrementally as the log
/// grows (locally or through replication). Clones and [`Bee::sub`] views
/// share the log, the cache, and the write lock.
#[derive(Clone)]
pub struct Bee {
    core: Core,
    prefix: Vec<u8>,
    snapshot: Arc<Mutex<Snapshot>>,
    write_lock: Arc<Mutex<()>>,
}

impl Bee {
    /// Wrap a log session.
    pub fn new(core: Core) -> Self {
        Self {
            core,
            prefix: Vec::new(),
            snapshot: Arc::new(Mutex::new(Snapshot::default())),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The underlying log session.
    pub fn core(&self) -> &Core {
        &self.core
    }

    /// A view whose keys live under `name`.
    pub fn sub(&self, name: impl AsRef<[u8]>) -> Self {
        let mut prefix = self.prefix.clone();
        prefix.extend_from_slice(name.as_ref());
        prefix.push(SUB_SEPARATOR);
        Self {
            core: self.core.clone(),
            prefix,
            snapshot: Arc::clone(&self.snapshot),
            write_lock: Arc::clone(&self.write_lock),
        }
    }

    /// Wait for the log, writing the header block on a fresh writable log.
    pub async fn ready(&self) -> BeeResult<()> {
        self.core.ready().await?;
        let _guard = self.write_lock.lock().await;
        self.ensure_header().await
    }

    /// Number of committed blocks, header included.
    pub fn version(&self) -> u64 {
        self.core.len()
    }

    /// Look up `key`. Absent keys are `Ok(None)`.
    pub async fn get(&self, key: impl AsRef<[u8]>) -> BeeResult<Option<Node>> {
        let full = self.full_key(key.as_ref());
        let mut snapshot = self.snapshot.lock().await;
        self.catch_up(&mut snapshot).await?;
        Ok(snapshot.entries.get(&full).map(|stored| Node {
            seq: stored.seq,
            key: key.as_ref().to_vec(),
            value: stored.value.clone(),
        }))
    }

    /// Insert or replace `key`.
    pub async fn put(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> BeeResult<()> {
        let mut batch = self.batch();
        batch.put(key, value);
        batch.flush().await
    }

    /// Remove `key`. Deleting an absent key still commits a block.
    pub async fn del(&self, key: impl AsRef<[u8]>) -> BeeResult<()> {
        let mut batch = self.batch();
        batch.del(key);
        batch.flush().await
    }

    /// Start a batch of mutations committed together by [`Batch::flush`].
    pub fn batch(&self) -> Batch {
        Batch::new(self.clone())
    }

    /// Entries within `options`, in key order (descending if `reverse`).
    pub async fn range(&self, options: RangeOptions) -> BeeResult<Vec<Node>> {
        let lower = match (&options.gt, &options.gte) {
            (Some(gt), _) => Bound::Excluded(self.full_key(gt)),
            (None, Some(gte)) => Bound::Included(self.full_key(gte)),
            (None, None) => Bound::Included(self.prefix.clone()),
        };
        let upper = match (&options.lt, &options.lte) {
            (Some(lt), _) => Bound::Excluded(self.full_key(lt)),
            (None, Some(lte)) => Bound::Included(self.full_key(lte)),
            (None, None) => Bound::Unbounded,
        };
        if bounds_are_empty(&lower, &upper) {
            return Ok(Vec::new());
        }

        let mut snapshot = self.snapshot.lock().await;
        self.catch_up(&mut snapshot).await?;

        let prefix = &self.prefix;
        let in_range = snapshot
            .entries
            .range((lower, upper))
            .filter(|(key, _)| key.starts_with(prefix));
        let to_node = |(key, stored): (&Vec<u8>, &Stored)| Node {
            seq: stored.seq,
            key: key[prefix.len()..].to_vec(),
            value: stored.value.clone(),
        };
        let limit = options.limit.unwrap_or(usize::MAX);
        let nodes = if options.reverse {
            in_range.rev().take(limit).map(to_node).collect()
        } else {
            in_range.take(limit).map(to_node).collect()
        };
        Ok(nodes)
    }

    /// Append `blocks` as one atomic write. Used by [`Batch::flush`].
    pub(crate) async fn commit(&self, blocks: Vec<Block>) -> BeeResult<()> {
        let encoded = blocks
            .iter()
            .map(Block::encode)
            .collect::<BeeResult<Vec<_>>>()?;
        let _guard = self.write_lock.lock().await;
        self.ensure_header().await?;
        let length = self.core.append(&encoded).await?;
        debug!(blocks = encoded.len(), length, "index batch committed");
        Ok(())
    }

    pub(crate) fn full_key(&self, key: &[u8]) -> Vec<u8> {
        let mut full = Vec::with_capacity(self.prefix.len() + key.len());
        full.extend_from_slice(&self.prefix);
        full.extend_from_slice(key);
        full
    }

    /// Caller must hold the write lock.
    async fn ensure_header(&self) -> BeeResult<()> {
        if self.core.writable() && self.core.is_empty() {
            let header = Block::Header(Header::default()).encode()?;
            self.core.append(&[header]).await?;
            debug!(key = %self.core.key().short_hex(), "index header written");
        }
        Ok(())
    }

    async fn catch_up(&self, snapshot: &mut Snapshot) -> BeeResult<()> {
        let length = self.core.len();
        while snapshot.length < length {
            let seq = snapshot.length;
            let bytes = self.core.get(seq).await?;
            match (seq, Block::decode(seq, &bytes)?) {
                (0, Block::Header(_)) => {}
                (0, Block::Entry { .. }) => {
                    return Err(BeeError::Decode {
                        seq,
                        reason: "first block is not an index header".into(),
                    })
                }
                (_, Block::Header(_)) => {
                    return Err(BeeError::Decode {
                        seq,
                        reason: "unexpected index header".into(),
                    })
                }
                (_, Block::Entry { key, value: Some(value) }) => {
                    snapshot.entries.insert(
                        key,
                        Stored {
                            seq,
                            value: Bytes::from(value),
                        },
                    );
                }
                (_, Block::Entry { key, value: None }) => {
                    snapshot.entries.remove(&key);
                }
            }
            snapshot.length = seq + 1;
        }
        Ok(())
    }
}

fn bounds_are_empty(lower: &Bound<Vec<u8>>, upper: &Bound<Vec<u8>>) -> bool {
    // BTreeMap::range panics on inverted or empty-excluded bounds.
    match (lower, upper) {
        (Bound::Included(lo), Bound::Included(hi)) => lo > hi,
        (Bound::Included(lo), Bound::Excluded(hi))
        | (Bound::Excluded(lo), Bound::Included(hi))
        | (Bound::Excluded(lo), Bound::Excluded(hi)) => lo >= hi,
        _ => false,
    }
}

impl std::fmt::Debug for Bee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bee")
            .field("core", &self.core)
            .field("prefix", &String::from_utf8_lossy(&self.prefix))
            .finish()
    }
}
