//! Per-message transition locks.
//!
//! A resolution message admits at most one in-flight transition. Locks are
//! keyed by message id and handed out as owned guards so a transition can
//! hold its lock across await points; the guard releases on drop, which
//! covers every exit path including errors, and evicts the table entry once
//! nothing else holds or waits on it.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use rollgate_domain::MessageId;

/// Lock table serializing transitions per message.
///
/// Lock entries are runtime-only state: they are never persisted and nothing
/// about a held lock is visible to other parties. An entry lives only while
/// some transition holds or waits on its lock.
pub struct TransitionLocks {
    locks: Arc<DashMap<MessageId, Arc<Mutex<()>>>>,
}

impl TransitionLocks {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Acquire the lock for one message, waiting while another transition on
    /// the same message is in flight.
    pub async fn acquire(&self, id: MessageId) -> TransitionGuard {
        let lock = self
            .locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        TransitionGuard {
            locks: self.locks.clone(),
            id,
            held: Some(lock.lock_owned().await),
        }
    }

    /// Number of messages with a transition holding or waiting on a lock.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Default for TransitionLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// Held transition lock for one message.
///
/// Releases the lock on drop and removes the table entry when no other
/// transition holds or waits on it.
pub struct TransitionGuard {
    locks: Arc<DashMap<MessageId, Arc<Mutex<()>>>>,
    id: MessageId,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for TransitionGuard {
    fn drop(&mut self) {
        // Drop the mutex guard first; a parked waiter still holds an Arc
        // clone and keeps the entry past the count check.
        self.held.take();
        self.locks
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
