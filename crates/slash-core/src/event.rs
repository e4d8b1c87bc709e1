//! Append notifications.
//!
//! Observers register a callback with [`Listeners::subscribe`] and receive an
//! [`AppendEvent`] synchronously after every committed append, whether the
//! blocks were written locally or arrived through replication. Callbacks are
//! invoked in commit order; there is no ordering guarantee between two
//! observers of the same append.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use slash_types::PublicKey;

/// Snapshot of a log right after an append was committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppendEvent {
    /// The log that grew.
    pub key: PublicKey,
    /// Length of the log after the append.
    pub length: u64,
    /// Plaintext byte length of the log after the append.
    pub byte_length: u64,
    /// Whether the blocks were replicated from a peer rather than written here.
    pub remote: bool,
}

/// Callback invoked on every append.
pub type AppendCallback = Arc<dyn Fn(&AppendEvent) + Send + Sync>;

/// Registry of append observers for one log.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: AtomicU64,
    callbacks: RwLock<Vec<(u64, AppendCallback)>>,
}

impl Listeners {
    /// Register `callback`; it stays registered until the returned
    /// [`Subscription`] is dropped.
    pub(crate) fn subscribe(self: &Arc<Self>, callback: AppendCallback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks
            .write()
            .expect("listener lock poisoned")
            .push((id, callback));
        Subscription {
            id,
            listeners: Arc::downgrade(self),
        }
    }

    /// Deliver `event` to every registered observer.
    pub(crate) fn emit(&self, event: &AppendEvent) {
        // Clone out of the lock so a callback may subscribe or unsubscribe.
        let callbacks: Vec<AppendCallback> = self
            .callbacks
            .read()
            .expect("listener lock poisoned")
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(event);
        }
    }

    fn unsubscribe(&self, id: u64) {
        self.callbacks
            .write()
            .expect("listener lock poisoned")
            .retain(|(existing, _)| *existing != id);
    }

    pub(crate) fn len(&self) -> usize {
        self.callbacks.read().expect("listener lock poisoned").len()
    }
}

/// Handle keeping an append observer registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.unsubscribe(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn event(length: u64) -> AppendEvent {
        AppendEvent {
            key: PublicKey::from_bytes([0; 32]),
            length,
            byte_length: length * 10,
            remote: false,
        }
    }

    #[test]
    fn subscribers_receive_events_in_order() {
        let listeners = Arc::new(Listeners::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = listeners.subscribe(Arc::new(move |e: &AppendEvent| {
            sink.lock().unwrap().push(e.length);
        }));

        listeners.emit(&event(1));
        listeners.emit(&event(2));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let listeners = Arc::new(Listeners::default());
        let count = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&count);
        let sub = listeners.subscribe(Arc::new(move |_: &AppendEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        listeners.emit(&event(1));
        drop(sub);
        listeners.emit(&event(2));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(listeners.len(), 0);
    }

    #[test]
    fn subscription_outliving_registry_is_harmless() {
        let listeners = Arc::new(Listeners::default());
        let sub = listeners.subscribe(Arc::new(|_: &AppendEvent| {}));
        drop(listeners);
        drop(sub);
    }
}
