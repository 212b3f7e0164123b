//! Recording collaborators

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::clock::Clock;
use crate::graph::{
    CameraController, CameraPose, CollaboratorError, GraphData, GraphView, LayoutEngine, Vec3, ViewportChange,
};
use crate::intercept::{InterceptedGraph, ViewportObserver};

/// In-memory graph instance
#[derive(Debug, Clone)]
pub struct SimGraph {
    id: String,
    data: GraphData,
    pose: Option<CameraPose>,
}

impl SimGraph {
    pub fn new(data: GraphData) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            data,
            pose: None,
        }
    }
}

impl GraphView for SimGraph {
    fn id(&self) -> &str {
        &self.id
    }

    fn graph_data(&self) -> &GraphData {
        &self.data
    }

    fn set_graph_data(&mut self, data: GraphData) {
        self.data = data;
    }

    fn camera_position(&self) -> Option<CameraPose> {
        self.pose
    }

    fn set_camera_position(&mut self, pose: CameraPose) {
        self.pose = Some(pose);
    }
}

/// A collaborator call as seen by the recorder
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "kebab-case")]
pub enum Call {
    ImproveSeparation {
        graph_id: String,
        maintain_hierarchy: bool,
        failed: bool,
    },
    FitAllNodes {
        graph_id: String,
        duration_ms: u64,
        maintain_angle: bool,
        failed: bool,
    },
    ObserveViewport {
        graph_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub at_ms: u64,
    #[serde(flatten)]
    pub call: Call,
}

/// Shared, clock-stamped log of collaborator calls
#[derive(Clone)]
pub struct Timeline {
    clock: Arc<dyn Clock>,
    entries: Arc<Mutex<Vec<TimelineEntry>>>,
}

impl Timeline {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Arc::new(clock),
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TimelineEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, call: Call) {
        let at_ms = self.clock.now().as_millis() as u64;
        debug!(at_ms, ?call, "Timeline::record");
        self.lock().push(TimelineEntry { at_ms, call });
    }

    /// Snapshot of everything recorded so far
    pub fn entries(&self) -> Vec<TimelineEntry> {
        self.lock().clone()
    }
}

/// Layout engine that records calls and optionally feeds them back into the graph
pub struct RecordingLayout {
    timeline: Timeline,
    write_back: bool,
    failures_left: u32,
}

impl RecordingLayout {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            write_back: false,
            failures_left: 0,
        }
    }

    /// Rewrite graph data after each successful call, like a re-heating solver
    pub fn with_write_back(mut self) -> Self {
        self.write_back = true;
        self
    }

    /// Fail the next `count` calls
    pub fn failing(mut self, count: u32) -> Self {
        self.failures_left = count;
        self
    }
}

impl LayoutEngine for RecordingLayout {
    fn improve_separation(
        &mut self,
        graph: &mut InterceptedGraph,
        maintain_hierarchy: bool,
    ) -> Result<(), CollaboratorError> {
        let empty = graph.graph_data().nodes.is_empty();
        let failed = empty || self.failures_left > 0;
        self.timeline.record(Call::ImproveSeparation {
            graph_id: graph.id().to_string(),
            maintain_hierarchy,
            failed,
        });

        if empty {
            return Err(CollaboratorError::EmptyGraph);
        }
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(CollaboratorError::Layout("simulated solver failure".to_string()));
        }

        if self.write_back {
            let data = graph.graph_data().clone();
            graph.set_graph_data(data);
        }
        Ok(())
    }
}

type ObserverSlot = Arc<Mutex<Option<ViewportObserver>>>;

/// Camera controller that records calls and optionally writes the fitted pose
pub struct RecordingCamera {
    timeline: Timeline,
    write_back: bool,
    failures_left: u32,
    observer: ObserverSlot,
}

impl RecordingCamera {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            write_back: false,
            failures_left: 0,
            observer: Arc::new(Mutex::new(None)),
        }
    }

    /// Write the fitted pose back to the graph after each successful call
    pub fn with_write_back(mut self) -> Self {
        self.write_back = true;
        self
    }

    /// Fail the next `count` calls
    pub fn failing(mut self, count: u32) -> Self {
        self.failures_left = count;
        self
    }

    /// Handle the host keeps to simulate window resizes
    pub fn resize_trigger(&self) -> ResizeTrigger {
        ResizeTrigger {
            observer: self.observer.clone(),
        }
    }
}

/// Pose that frames `nodes` nodes around the origin
fn framing_pose(nodes: usize, current: Option<CameraPose>, maintain_angle: bool) -> CameraPose {
    let distance = 100.0 + 15.0 * (nodes as f32).sqrt();

    let direction = match current {
        Some(pose) if maintain_angle => {
            let (dx, dy, dz) = (
                pose.position.x - pose.look_at.x,
                pose.position.y - pose.look_at.y,
                pose.position.z - pose.look_at.z,
            );
            let len = (dx * dx + dy * dy + dz * dz).sqrt();
            if len > f32::EPSILON {
                Vec3::new(dx / len, dy / len, dz / len)
            } else {
                Vec3::new(0.0, 0.0, 1.0)
            }
        }
        _ => Vec3::new(0.0, 0.0, 1.0),
    };

    CameraPose::new(
        Vec3::new(direction.x * distance, direction.y * distance, direction.z * distance),
        Vec3::ZERO,
    )
}

impl CameraController for RecordingCamera {
    fn fit_all_nodes(
        &mut self,
        graph: &mut InterceptedGraph,
        duration: Duration,
        maintain_angle: bool,
    ) -> Result<(), CollaboratorError> {
        let failed = self.failures_left > 0;
        self.timeline.record(Call::FitAllNodes {
            graph_id: graph.id().to_string(),
            duration_ms: duration.as_millis() as u64,
            maintain_angle,
            failed,
        });

        if failed {
            self.failures_left -= 1;
            return Err(CollaboratorError::Camera("simulated tween failure".to_string()));
        }

        if self.write_back {
            let pose = framing_pose(graph.graph_data().nodes.len(), graph.camera_position(), maintain_angle);
            graph.set_camera_position(pose);
        }
        Ok(())
    }

    fn setup_viewport_observer(&mut self, graph: &InterceptedGraph, observer: ViewportObserver) {
        self.timeline.record(Call::ObserveViewport {
            graph_id: graph.id().to_string(),
        });
        *self.observer.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(observer);
    }
}

/// Simulates viewport resizes through whatever observer the camera holds
#[derive(Clone)]
pub struct ResizeTrigger {
    observer: ObserverSlot,
}

impl ResizeTrigger {
    /// The currently installed observer, if any
    pub fn observer(&self) -> Option<ViewportObserver> {
        self.observer.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// Notify the installed observer; false if none is installed yet
    pub fn resize(&self, change: ViewportChange) -> bool {
        match self.observer() {
            Some(observer) => {
                observer.notify(change);
                true
            }
            None => {
                debug!(?change, "ResizeTrigger::resize: no observer installed");
                false
            }
        }
    }
}
