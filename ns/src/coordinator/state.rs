//! Coordinator state and the fire-time checks made against it

use std::time::Duration;

use serde::Serialize;

use crate::graph::CameraPose;

/// Mutable state owned exclusively by one coordinator
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoordinatorState {
    /// True while an explicit coordination cycle is in flight
    pub coordinating: bool,

    /// Explicit cycles started but not yet finished
    pub cycles_in_flight: u32,

    /// Last layout change, as clock offset; `None` until one happens
    pub last_layout_change: Option<Duration>,

    /// Last camera movement, as clock offset; `None` until one happens
    pub last_camera_movement: Option<Duration>,

    /// Last pose observed through interception
    pub current_camera_pose: Option<CameraPose>,
}

/// Condition a deferred task must still satisfy when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Guard {
    /// Always fires
    Always,
    /// Skipped while an explicit cycle holds control
    Idle,
    /// Idle, and the camera has not moved within the settle window
    IdleAndCameraSettled,
}

/// Outcome of checking a guard at fire time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    Fire,
    /// An explicit cycle holds control
    Suppressed,
    /// A newer camera movement superseded the task
    Stale,
}

impl CoordinatorState {
    /// More than `cooldown` has passed since the last layout change
    pub fn layout_cooled_down(&self, now: Duration, cooldown: Duration) -> bool {
        match self.last_layout_change {
            Some(at) => now.saturating_sub(at) > cooldown,
            None => true,
        }
    }

    /// The camera has been still for at least `window`
    pub fn camera_settled(&self, now: Duration, window: Duration) -> bool {
        match self.last_camera_movement {
            Some(at) => now.saturating_sub(at) >= window,
            None => true,
        }
    }

    pub(crate) fn check(&self, guard: Guard, now: Duration, settle_window: Duration) -> Verdict {
        match guard {
            Guard::Always => Verdict::Fire,
            Guard::Idle if self.coordinating => Verdict::Suppressed,
            Guard::Idle => Verdict::Fire,
            Guard::IdleAndCameraSettled if self.coordinating => Verdict::Suppressed,
            Guard::IdleAndCameraSettled if !self.camera_settled(now, settle_window) => Verdict::Stale,
            Guard::IdleAndCameraSettled => Verdict::Fire,
        }
    }

    pub(crate) fn begin_cycle(&mut self) {
        self.cycles_in_flight += 1;
        self.coordinating = true;
    }

    pub(crate) fn end_cycle(&mut self) {
        self.cycles_in_flight = self.cycles_in_flight.saturating_sub(1);
        self.coordinating = self.cycles_in_flight > 0;
    }
}
