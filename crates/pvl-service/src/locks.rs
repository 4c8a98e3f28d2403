use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use pvl_types::BatchId;
use tracing::warn;

use crate::error::{ServiceError, ServiceResult};

/// Per-batch writer locks with a bounded wait.
///
/// Slots are created on first use and kept for the life of the process.
/// Callers lock only batches that exist, and batches are never deleted, so
/// the map is bounded by the batch count.
pub struct BatchLocks {
    slots: Mutex<HashMap<BatchId, Arc<Mutex<()>>>>,
    timeout: Duration,
}

impl BatchLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of batches that have been locked at least once.
    pub fn slot_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Run `f` while holding the lock for `batch`.
    ///
    /// Fails with `Busy` if the lock is not acquired within the timeout.
    pub fn with_lock<T>(
        &self,
        batch: &BatchId,
        f: impl FnOnce() -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let slot = Arc::clone(self.slots.lock().entry(*batch).or_default());

        let started = Instant::now();
        let Some(_guard) = slot.try_lock_for(self.timeout) else {
            let waited = started.elapsed();
            warn!(batch = %batch, waited_ms = waited.as_millis() as u64, "batch lock timed out");
            return Err(ServiceError::Busy {
                batch: *batch,
                waited,
            });
        };
        f()
    }
}

impl std::fmt::Debug for BatchLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchLocks")
            .field("slots", &self.slot_count())
            .field("timeout", &self.timeout)
            .finish()
    }
}
