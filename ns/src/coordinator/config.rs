//! Coordinator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Coordinator configuration
///
/// Immutable once the coordinator is built. Missing keys fall back to defaults;
/// values are not validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Correct the layout in response to camera movement and resizes
    #[serde(rename = "auto-adjust-layout", default = "default_true")]
    pub auto_adjust_layout: bool,

    /// Refit the camera in response to graph data changes
    #[serde(rename = "auto-adjust-camera", default = "default_true")]
    pub auto_adjust_camera: bool,

    /// Delay before a camera correction, in milliseconds
    #[serde(rename = "camera-adjustment-delay-ms", default = "default_camera_adjustment_delay_ms")]
    pub camera_adjustment_delay_ms: u64,

    /// Delay before a layout correction, in milliseconds
    #[serde(rename = "layout-adjustment-delay-ms", default = "default_layout_adjustment_delay_ms")]
    pub layout_adjustment_delay_ms: u64,

    /// Minimum time since the last layout change before camera movement may
    /// schedule another layout correction
    #[serde(rename = "layout-cooldown-ms", default = "default_layout_cooldown_ms")]
    pub layout_cooldown_ms: u64,

    /// A scheduled layout correction aborts if the camera moved within this window
    #[serde(rename = "camera-settle-window-ms", default = "default_camera_settle_window_ms")]
    pub camera_settle_window_ms: u64,

    /// Log every coordination decision at INFO instead of DEBUG
    #[serde(default)]
    pub debug: bool,
}

fn default_true() -> bool {
    true
}

fn default_camera_adjustment_delay_ms() -> u64 {
    debug!("default_camera_adjustment_delay_ms: called");
    500
}

fn default_layout_adjustment_delay_ms() -> u64 {
    debug!("default_layout_adjustment_delay_ms: called");
    300
}

fn default_layout_cooldown_ms() -> u64 {
    debug!("default_layout_cooldown_ms: called");
    1000
}

fn default_camera_settle_window_ms() -> u64 {
    debug!("default_camera_settle_window_ms: called");
    300
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        debug!("CoordinatorConfig::default: called");
        Self {
            auto_adjust_layout: true,
            auto_adjust_camera: true,
            camera_adjustment_delay_ms: 500,
            layout_adjustment_delay_ms: 300,
            layout_cooldown_ms: 1000,
            camera_settle_window_ms: 300,
            debug: false,
        }
    }
}

impl CoordinatorConfig {
    pub fn camera_adjustment_delay(&self) -> Duration {
        Duration::from_millis(self.camera_adjustment_delay_ms)
    }

    pub fn layout_adjustment_delay(&self) -> Duration {
        Duration::from_millis(self.layout_adjustment_delay_ms)
    }

    pub fn layout_cooldown(&self) -> Duration {
        Duration::from_millis(self.layout_cooldown_ms)
    }

    pub fn camera_settle_window(&self) -> Duration {
        Duration::from_millis(self.camera_settle_window_ms)
    }
}
