use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::info;

use crate::error::ReplicationError;
use crate::store::{Peer, StoreInner};

static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(1);

/// Options for a replication stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplicateOptions {
    /// Push appends to the peer as they happen. Without it, data only
    /// moves when a log calls `update()`.
    pub live: bool,
}

impl ReplicateOptions {
    /// Options for a live stream.
    pub fn live() -> Self {
        Self { live: true }
    }
}

/// State shared by both ends of a connected stream pair.
struct Link {
    connection: u64,
    open: AtomicBool,
    ends: [Weak<StoreInner>; 2],
}

impl Link {
    fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            for end in self.ends.iter().filter_map(Weak::upgrade) {
                end.disconnect(self.connection);
            }
            info!(connection = self.connection, "replication stream disconnected");
        }
    }
}

/// One end of an in-memory replication link between two storage roots.
///
/// Both roots exchange blocks for every log they both have open. Blocks are
/// signature-checked by the receiving end before they are committed. The
/// link is torn down when either end is dropped.
pub struct ReplicationStream {
    store: Arc<StoreInner>,
    is_initiator: bool,
    options: ReplicateOptions,
    link: Mutex<Option<Arc<Link>>>,
}

impl ReplicationStream {
    pub(crate) fn new(store: Arc<StoreInner>, is_initiator: bool, options: ReplicateOptions) -> Self {
        Self {
            store,
            is_initiator,
            options,
            link: Mutex::new(None),
        }
    }

    /// Whether this end opened the connection.
    pub fn is_initiator(&self) -> bool {
        self.is_initiator
    }

    /// The options this end was created with.
    pub fn options(&self) -> ReplicateOptions {
        self.options
    }

    /// Whether this end is currently linked to a peer.
    pub fn is_connected(&self) -> bool {
        self.link
            .lock()
            .expect("stream lock poisoned")
            .as_ref()
            .is_some_and(|link| link.open.load(Ordering::SeqCst))
    }

    /// Link two stream ends. The link is live if either end asked for it.
    pub fn connect(&self, remote: &ReplicationStream) -> Result<(), ReplicationError> {
        if self.is_initiator == remote.is_initiator {
            return Err(ReplicationError::SameRole);
        }
        if Arc::ptr_eq(&self.store, &remote.store) {
            return Err(ReplicationError::SameStore);
        }

        if self.is_connected() || remote.is_connected() {
            return Err(ReplicationError::AlreadyConnected);
        }

        let connection = NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed);
        let live = self.options.live || remote.options.live;
        self.store.peers.write().expect("peer lock poisoned").push(Peer {
            connection,
            remote: Arc::downgrade(&remote.store),
            live,
        });
        remote.store.peers.write().expect("peer lock poisoned").push(Peer {
            connection,
            remote: Arc::downgrade(&self.store),
            live,
        });
        let link = Arc::new(Link {
            connection,
            open: AtomicBool::new(true),
            ends: [Arc::downgrade(&self.store), Arc::downgrade(&remote.store)],
        });
        *self.link.lock().expect("stream lock poisoned") = Some(Arc::clone(&link));
        *remote.link.lock().expect("stream lock poisoned") = Some(link);

        info!(connection, live, "replication stream connected");
        Ok(())
    }

    /// Tear the link down. Dropping the stream does the same.
    pub fn disconnect(&self) {
        let link = self.link.lock().expect("stream lock poisoned").take();
        if let Some(link) = link {
            link.close();
        }
    }
}

impl Drop for ReplicationStream {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for ReplicationStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicationStream")
            .field("is_initiator", &self.is_initiator)
            .field("options", &self.options)
            .field("connected", &self.is_connected())
            .finish()
    }
}
