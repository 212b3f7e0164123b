//! Options for coordination cycles and coordinator construction

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::graph::{CameraController, GraphView, LayoutEngine};

use super::config::CoordinatorConfig;

/// Called once at the end of every explicit coordination cycle
pub type CompletionCallback = Box<dyn FnMut() + Send>;

/// How the layout engine should run a correction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutOptions {
    #[serde(rename = "maintain-hierarchy", default = "default_maintain_hierarchy")]
    pub maintain_hierarchy: bool,
}

fn default_maintain_hierarchy() -> bool {
    true
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            maintain_hierarchy: true,
        }
    }
}

/// How the camera controller should run a "fit all nodes" correction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraOptions {
    /// Tween duration in milliseconds
    #[serde(rename = "duration-ms", default = "default_camera_duration_ms")]
    pub duration_ms: u64,

    /// Keep the current viewing angle while refitting
    #[serde(rename = "maintain-angle", default)]
    pub maintain_angle: bool,
}

fn default_camera_duration_ms() -> u64 {
    800
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            duration_ms: 800,
            maintain_angle: false,
        }
    }
}

impl CameraOptions {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Options for one explicit coordination cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateOptions {
    #[serde(default)]
    pub layout: LayoutOptions,
    #[serde(default)]
    pub camera: CameraOptions,
}

/// Everything a coordinator is built from
///
/// Collaborators are injected here; any of them may be missing, in which case
/// the operations that need them become logged no-ops.
#[derive(Default)]
pub struct InitOptions {
    pub config: CoordinatorConfig,
    pub graph: Option<Box<dyn GraphView>>,
    pub layout: Option<Box<dyn LayoutEngine>>,
    pub camera: Option<Box<dyn CameraController>>,
    /// Defaults to a [`crate::clock::TokioClock`]
    pub clock: Option<Arc<dyn Clock>>,
    pub on_coordination_complete: Option<CompletionCallback>,
}

impl InitOptions {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn graph(mut self, graph: impl GraphView + 'static) -> Self {
        self.graph = Some(Box::new(graph));
        self
    }

    pub fn layout(mut self, layout: impl LayoutEngine + 'static) -> Self {
        self.layout = Some(Box::new(layout));
        self
    }

    pub fn camera(mut self, camera: impl CameraController + 'static) -> Self {
        self.camera = Some(Box::new(camera));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn on_coordination_complete(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_coordination_complete = Some(Box::new(callback));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_coordinate_options() {
        let options = CoordinateOptions::default();
        assert!(options.layout.maintain_hierarchy);
        assert_eq!(options.camera.duration(), Duration::from_millis(800));
        assert!(!options.camera.maintain_angle);
    }

    #[test]
    fn test_partial_options_deserialize() {
        let options: CoordinateOptions = serde_yaml::from_str("layout:\n  maintain-hierarchy: false\n").unwrap();
        assert!(!options.layout.maintain_hierarchy);
        assert_eq!(options.camera, CameraOptions::default());
    }
}
