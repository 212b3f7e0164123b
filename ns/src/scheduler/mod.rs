//! Fire-once timer queue
//!
//! Deferred corrections are plain data held in a queue ordered by due time. Nothing
//! is ever cancelled: the owner decides at fire time whether a timer still applies.

mod core;
mod timer;

pub use core::TimerQueue;
pub use timer::{Timer, TimerId, TimerStats};
