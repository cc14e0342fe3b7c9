//! # Per-Record Write Locks
//!
//! Serializes writers of the same booking while leaving different bookings
//! independent.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RecordLocks                                                            │
//! │    "BK-1" ──► Mutex ◄── save_booking      (holds)                       │
//! │                     ◄── create sweep      (waits)                       │
//! │    "BK-2" ──► Mutex ◄── update sweep      (holds, unaffected by BK-1)   │
//! │                                                                         │
//! │  Entries are created on first use and removed when the last guard or   │
//! │  waiter for that id goes away.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slot = Arc<AsyncMutex<()>>;

/// Registry of async locks keyed by booking id.
#[derive(Debug, Clone, Default)]
pub struct RecordLocks {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl RecordLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive write access to one record.
    pub async fn lock(&self, booking_id: &str) -> RecordGuard {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(booking_id.to_string()).or_default().clone()
        };

        let guard = slot.lock_owned().await;

        RecordGuard {
            booking_id: booking_id.to_string(),
            locks: self.clone(),
            guard: Some(guard),
        }
    }

    /// Locks several records in a fixed (sorted) order so that two
    /// multi-record writers can never deadlock each other.
    pub async fn lock_many<'a, I>(&self, booking_ids: I) -> Vec<RecordGuard>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut ids: Vec<&str> = booking_ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            guards.push(self.lock(id).await);
        }
        guards
    }

    /// Number of ids currently tracked.
    pub fn tracked(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn release(&self, booking_id: &str) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = slots
            .get(booking_id)
            .map(|slot| Arc::strong_count(slot) == 1)
            .unwrap_or(false);
        if idle {
            slots.remove(booking_id);
        }
    }
}

/// Exclusive access to one booking id. Released on drop.
#[derive(Debug)]
pub struct RecordGuard {
    booking_id: String,
    locks: RecordLocks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl RecordGuard {
    pub fn booking_id(&self) -> &str {
        &self.booking_id
    }
}

impl Drop for RecordGuard {
    fn drop(&mut self) {
        // The owned guard keeps its own Arc to the slot; drop it first so
        // the registry sees the true number of holders.
        self.guard.take();
        self.locks.release(&self.booking_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_different_ids_do_not_block() {
        let locks = RecordLocks::new();
        let _a = locks.lock("BK-1").await;

        let b = tokio::time::timeout(Duration::from_millis(200), locks.lock("BK-2")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_same_id_waits_for_release() {
        let locks = RecordLocks::new();
        let first = locks.lock("BK-1").await;

        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.lock("BK-1")).await;
        assert!(blocked.is_err());

        drop(first);
        let second = tokio::time::timeout(Duration::from_millis(200), locks.lock("BK-1")).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_entries_are_pruned() {
        let locks = RecordLocks::new();
        {
            let _guards = locks.lock_many(["BK-2", "BK-1", "BK-2"]).await;
            assert_eq!(locks.tracked(), 2);
        }
        assert_eq!(locks.tracked(), 0);
    }
}
