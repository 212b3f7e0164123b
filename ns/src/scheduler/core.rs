//! Timer queue implementation

use std::collections::BinaryHeap;
use std::time::Duration;

use tracing::debug;

use super::timer::{Timer, TimerId, TimerStats};

/// Fire-once timers ordered by due time
///
/// Timers due at the same time fire in the order they were scheduled.
#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Timer<T>>,
    next_id: u64,
    stats: TimerStats,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_id: 0,
            stats: TimerStats::default(),
        }
    }

    /// Schedule `task` to become due `delay` after `now`
    pub fn schedule(&mut self, now: Duration, delay: Duration, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due = now + delay;
        debug!(?id, ?now, ?due, "TimerQueue::schedule: called");

        self.heap.push(Timer {
            id,
            due,
            task,
        });
        self.stats.total_scheduled += 1;
        self.stats.peak_pending = self.stats.peak_pending.max(self.heap.len());
        id
    }

    /// Remove and return the earliest timer if it is due at `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<Timer<T>> {
        if self.heap.peek().is_some_and(|t| t.due <= now) {
            let timer = self.heap.pop()?;
            debug!(id = ?timer.id, due = ?timer.due, ?now, "TimerQueue::pop_due: firing");
            self.stats.total_fired += 1;
            return Some(timer);
        }
        None
    }

    /// Due time of the earliest pending timer
    pub fn next_due(&self) -> Option<Duration> {
        self.heap.peek().map(|t| t.due)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn stats(&self) -> &TimerStats {
        &self.stats
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
