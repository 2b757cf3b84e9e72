//! Lock-free cursor handing out target indices to workers

use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared, monotonically advancing cursor over a fixed number of targets
///
/// Every call to [`WorkQueue::claim_next`] atomically claims the next index,
/// so no two workers ever probe the same target and no central dispatcher is
/// needed. Once the cursor passes the end it stays exhausted.
///
/// # Examples
///
/// ```
/// # use lanprobe_lib::scanners::queue::WorkQueue;
/// let queue = WorkQueue::new(2);
/// assert_eq!(queue.claim_next(), Some(0));
/// assert_eq!(queue.claim_next(), Some(1));
/// assert_eq!(queue.claim_next(), None);
/// assert_eq!(queue.claim_next(), None);
/// ```
#[derive(Debug)]
pub struct WorkQueue {
    next: AtomicUsize,
    len: usize,
}

impl WorkQueue {
    /// Returns a new queue over `len` targets
    pub fn new(len: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            len,
        }
    }

    /// Claims the next unclaimed index, or None once every index has been
    /// handed out
    pub fn claim_next(&self) -> Option<usize> {
        // only uniqueness matters here, the target list is immutable
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        (index < self.len).then_some(index)
    }

    /// Total number of indices this queue hands out
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the queue was created over zero targets
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true once every index has been claimed
    pub fn is_exhausted(&self) -> bool {
        self.next.load(Ordering::Relaxed) >= self.len
    }
}

#[cfg(test)]
#[path = "./queue_tests.rs"]
mod tests;
