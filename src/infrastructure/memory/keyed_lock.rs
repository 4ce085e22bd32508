//! Per-key mutual exclusion for the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// Default bounded wait for a keyed lock.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_millis(500);

/// A mutex per post id.
///
/// Slots exist only while a section holds or waits on them, so the map is
/// bounded by the number of concurrent sections. Callers never hold two slots
/// at once, so no lock ordering is required.
pub struct KeyedLocks {
    slots: DashMap<i64, Arc<Mutex<()>>>,
    wait: Duration,
}

impl KeyedLocks {
    pub fn new(wait: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            wait,
        }
    }

    /// Run `f` while holding the lock for `key`.
    ///
    /// Fails with `AppError::Conflict` when the lock is not acquired within
    /// the configured wait.
    pub fn with_lock<T>(
        &self,
        key: i64,
        f: impl FnOnce() -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let slot = {
            let entry = self
                .slots
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())));
            Arc::clone(entry.value())
        };

        let result = match slot.try_lock_for(self.wait) {
            Some(_guard) => f(),
            None => {
                metrics::record_store_conflict("posts");
                tracing::debug!(post_id = key, wait_ms = self.wait.as_millis() as u64, "Keyed lock wait timed out");
                Err(AppError::Conflict(format!("post {key} is being modified concurrently")))
            }
        };

        drop(slot);
        self.release(key);
        result
    }

    /// Drop the slot for `key` unless another section still holds a handle.
    ///
    /// Handles are cloned under the shard lock taken by `entry`, so a count of
    /// one seen under `remove_if` cannot race with a new waiter.
    fn release(&self, key: i64) {
        self.slots.remove_if(&key, |_, slot| Arc::strong_count(slot) == 1);
    }
}

impl Default for KeyedLocks {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_WAIT)
    }
}
