use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::timeout;
use tracing::debug;

use crate::error::ReservationError;

/// Striped lock over a fixed set of day slots, allowing callers to hold a
/// contiguous sub-range of the slots for the duration of one operation.
///
/// Locks are always acquired in ascending slot order. Two callers whose
/// ranges overlap therefore contend on the lowest shared slot first, so no
/// cyclic wait can form, while callers with disjoint ranges proceed fully in
/// parallel.
pub struct StripedLocks {
    locks: Vec<Arc<Mutex<()>>>,
    max_wait: Duration,
}

impl StripedLocks {
    /// Builds a striped lock of `nb_locks` slots. Each individual
    /// acquisition waits at most `max_wait` before the whole range
    /// acquisition is abandoned.
    pub fn new(nb_locks: usize, max_wait: Duration) -> Self {
        Self {
            locks: (0..nb_locks).map(|_| Arc::new(Mutex::new(()))).collect(),
            max_wait,
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// True when the stripe has no slots.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Acquires the locks for slots `start..=end`, strictly in ascending
    /// order, each acquisition bounded by the configured wait.
    ///
    /// On success the returned guard holds the whole range; dropping it
    /// releases the slots in descending order. If any acquisition in the
    /// chain times out, every lock already held is released in descending
    /// order and the operation fails with [`ReservationError::LockTimeout`],
    /// leaving retrying to the caller.
    ///
    /// Requires `start <= end < self.len()`.
    pub async fn lock_range(&self, start: usize, end: usize) -> Result<RangeGuard, ReservationError> {
        debug_assert!(start <= end && end < self.locks.len());

        let mut guards = Vec::with_capacity(end - start + 1);
        for index in start..=end {
            match timeout(self.max_wait, self.locks[index].clone().lock_owned()).await {
                Ok(guard) => {
                    debug!("Acquired lock {}", index);
                    guards.push(guard);
                }
                Err(_) => {
                    debug!("Timed out waiting for lock {}", index);
                    // unwind the partially acquired range, highest slot first
                    while let Some(guard) = guards.pop() {
                        drop(guard);
                    }
                    return Err(ReservationError::LockTimeout);
                }
            }
        }
        debug!("Acquired all locks in {}..={}", start, end);

        Ok(RangeGuard { start, guards })
    }
}

/// Guard over a held contiguous range of slot locks. Releases the slots in
/// descending order when dropped, on every exit path.
pub struct RangeGuard {
    start: usize,
    guards: Vec<OwnedMutexGuard<()>>,
}

impl Drop for RangeGuard {
    fn drop(&mut self) {
        while let Some(guard) = self.guards.pop() {
            debug!("Releasing lock {}", self.start + self.guards.len());
            drop(guard);
        }
    }
}
