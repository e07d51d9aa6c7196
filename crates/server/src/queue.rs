//! Dual-buffer dispatch queue
//!
//! Two fixed buffers: producers push into the *active* one under the
//! producer lock; the dispatcher drains the *backlog* one, which is
//! private to it between context switches. The dispatcher records
//! `drain_len()` at the start of a round, pulls exactly that many
//! items, and calls [`DualBufferQueue::switch_context`] exactly once at
//! the end of the round - items pushed during a drain land in the
//! active buffer and are drained next round.
//!
//! This keeps producers off the drain path entirely: the only
//! contention a session ever sees is the duration of one push.

use std::collections::VecDeque;

use parking_lot::Mutex;

/// Single-consumer FIFO with an atomic context switch for draining
#[derive(Debug)]
pub struct DualBufferQueue<T> {
    /// Producer side; pushes land here
    active: Mutex<VecDeque<T>>,
    /// Dispatcher side; private to the drain loop between switches
    backlog: Mutex<VecDeque<T>>,
}

impl<T> DualBufferQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            active: Mutex::new(VecDeque::new()),
            backlog: Mutex::new(VecDeque::new()),
        }
    }

    /// Push an item into the active buffer
    pub fn push(&self, item: T) {
        self.active.lock().push_back(item);
    }

    /// Number of items waiting in the active buffer
    pub fn len(&self) -> usize {
        self.active.lock().len()
    }

    /// Whether the active buffer is empty
    pub fn is_empty(&self) -> bool {
        self.active.lock().is_empty()
    }

    /// Number of items in the drain buffer
    ///
    /// Record this once at the start of a round and pull exactly that
    /// many items.
    pub fn drain_len(&self) -> usize {
        self.backlog.lock().len()
    }

    /// Remove the head of the drain buffer
    pub fn pull(&self) -> Option<T> {
        self.backlog.lock().pop_front()
    }

    /// Swap the buffers
    ///
    /// Called by the dispatcher exactly once per round, after draining.
    /// Both locks are taken for the duration of a pointer swap.
    pub fn switch_context(&self) {
        let mut active = self.active.lock();
        let mut backlog = self.backlog.lock();
        std::mem::swap(&mut *active, &mut *backlog);
    }
}

impl<T> Default for DualBufferQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;
