//! Per-key exclusive locks
//!
//! Each key gets its own `tokio::sync::Mutex`, created on first use and
//! dropped again once nobody holds or waits for it. Different keys never
//! contend. The tokio mutex is fair, so waiters on one key are served in
//! request order.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

struct Slot {
    mutex: Arc<Mutex<()>>,
    /// Holders plus waiters
    users: usize,
}

/// Lock table keyed by `K`
pub struct KeyLocks<K: Eq + Hash> {
    slots: Arc<DashMap<K, Slot>>,
}

/// Exclusive access to one key, released on drop
pub struct KeyGuard<K: Eq + Hash> {
    // Field order matters: the permit must be released before the ticket
    // gives up the slot, or a newcomer could get a fresh mutex while this
    // one is still held.
    _permit: OwnedMutexGuard<()>,
    _ticket: Ticket<K>,
}

/// Registration in a slot; decrements the user count on drop, including
/// when an async acquire is abandoned before it got the lock.
struct Ticket<K: Eq + Hash> {
    slots: Arc<DashMap<K, Slot>>,
    key: K,
}

impl<K: Eq + Hash> Drop for Ticket<K> {
    fn drop(&mut self) {
        let removed = self.slots.remove_if_mut(&self.key, |_, slot| {
            slot.users -= 1;
            slot.users == 0
        });
        if removed.is_some() {
            trace!("Reclaimed idle key lock");
        }
    }
}

impl<K: Eq + Hash + Clone> KeyLocks<K> {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
        }
    }

    /// Block the current thread until the key is free
    ///
    /// Panics if called from within an async runtime context, unless wrapped
    /// in `block_in_place`; use `acquire_async` there.
    pub fn acquire(&self, key: &K) -> KeyGuard<K> {
        let (ticket, mutex) = self.register(key);
        KeyGuard {
            _permit: mutex.blocking_lock_owned(),
            _ticket: ticket,
        }
    }

    /// Suspend until the key is free
    ///
    /// Cancel-safe: dropping the future before it resolves leaves no trace.
    pub async fn acquire_async(&self, key: &K) -> KeyGuard<K> {
        let (ticket, mutex) = self.register(key);
        KeyGuard {
            _permit: mutex.lock_owned().await,
            _ticket: ticket,
        }
    }

    /// Number of keys currently held or awaited
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn register(&self, key: &K) -> (Ticket<K>, Arc<Mutex<()>>) {
        let mut slot = self.slots.entry(key.clone()).or_insert_with(|| Slot {
            mutex: Arc::new(Mutex::new(())),
            users: 0,
        });
        slot.users += 1;
        let mutex = Arc::clone(&slot.mutex);
        drop(slot);

        let ticket = Ticket {
            slots: Arc::clone(&self.slots),
            key: key.clone(),
        };
        (ticket, mutex)
    }
}

impl<K: Eq + Hash + Clone> Default for KeyLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}
