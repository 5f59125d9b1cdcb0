//! Single-writer snapshot publication
//!
//! The receiver and the fusion engine each own their state and hand out
//! whole snapshots. A [`Publisher`] swaps in a freshly built `Arc<T>` under a
//! short write lock; every [`SnapshotReader`] gets the latest complete value
//! and never sees a half-written one.

use std::sync::{Arc, PoisonError, RwLock};

type Slot<T> = Arc<RwLock<Arc<T>>>;

/// Write side, held by the component that owns the state
#[derive(Debug)]
pub struct Publisher<T> {
    slot: Slot<T>,
}

/// Read side, cheap to clone and safe to move to other threads
///
/// # Example
/// ```
/// use navcore::publish::Publisher;
///
/// let publisher = Publisher::new(1u32);
/// let reader = publisher.reader();
/// publisher.publish(2);
/// assert_eq!(*reader.snapshot(), 2);
/// ```
#[derive(Debug)]
pub struct SnapshotReader<T> {
    slot: Slot<T>,
}

impl<T> Clone for SnapshotReader<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Publisher<T> {
    pub fn new(initial: T) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    /// Replace the published value
    pub fn publish(&self, value: T) {
        let value = Arc::new(value);
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = value;
    }

    pub fn reader(&self) -> SnapshotReader<T> {
        SnapshotReader {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> SnapshotReader<T> {
    /// The value most recently published
    pub fn snapshot(&self) -> Arc<T> {
        read_slot(&self.slot)
    }
}

fn read_slot<T>(slot: &Slot<T>) -> Arc<T> {
    let guard = slot.read().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(&guard)
}
