//! Timer types for the queue

use std::time::Duration;

use serde::Serialize;

/// Identifier handed out when a timer is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimerId(pub u64);

/// A scheduled task
#[derive(Debug, Clone)]
pub struct Timer<T> {
    pub id: TimerId,
    /// When it becomes due
    pub due: Duration,
    pub task: T,
}

impl<T> Eq for Timer<T> {}

impl<T> PartialEq for Timer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Ord for Timer<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Max-heap: earliest due first, then earliest scheduled
        other.due.cmp(&self.due).then_with(|| other.id.cmp(&self.id))
    }
}

impl<T> PartialOrd for Timer<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Statistics for the timer queue
#[derive(Debug, Default, Clone, Serialize)]
pub struct TimerStats {
    pub total_scheduled: u64,
    pub total_fired: u64,
    pub peak_pending: usize,
}
