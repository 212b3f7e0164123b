//! Scripted scenarios
//!
//! A scenario is a YAML timeline of camera writes, data writes, resizes and
//! coordination cycles. It can be replayed instantly against a [`ManualClock`]
//! or paced in real time through the coordinator task.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{ManualClock, TokioClock};
use crate::coordinator::{
    CoordinateOptions, Coordinator, CoordinatorConfig, CoordinatorHandle, CoordinatorMetrics, CoordinatorState,
    DEFAULT_CHANNEL_BUFFER, InitOptions, spawn,
};
use crate::graph::{CameraPose, GraphData, Vec3, ViewportChange};

use super::recorder::{RecordingCamera, RecordingLayout, ResizeTrigger, SimGraph, Timeline, TimelineEntry};

/// A scripted timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,

    /// Nodes in the graph bound at startup
    #[serde(rename = "initial-nodes", default = "default_initial_nodes")]
    pub initial_nodes: usize,

    /// Bind a graph at startup; when false the first `bind-graph` step does it
    #[serde(rename = "bind-graph", default = "default_true")]
    pub bind_graph: bool,

    /// Collaborators write their results back to the graph, reproducing the
    /// side effects a real layout engine and camera have
    #[serde(rename = "write-back", default = "default_true")]
    pub write_back: bool,

    #[serde(rename = "layout-failures", default)]
    pub layout_failures: u32,

    #[serde(rename = "camera-failures", default)]
    pub camera_failures: u32,

    /// Overrides the coordinator section of the loaded config
    #[serde(default)]
    pub coordinator: Option<CoordinatorConfig>,

    /// Keep running this long after start; defaults to 5s past the last step
    #[serde(rename = "run-until-ms", default)]
    pub run_until_ms: Option<u64>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_initial_nodes() -> usize {
    12
}

fn default_true() -> bool {
    true
}

/// One scripted action at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    #[serde(rename = "at-ms")]
    pub at_ms: u64,
    pub action: Action,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Action {
    /// Write a camera pose
    MoveCamera {
        position: Vec3,
        #[serde(rename = "look-at", default)]
        look_at: Vec3,
    },

    /// Replace graph data with a generated graph of `nodes` nodes
    SetGraphData { nodes: usize },

    /// Write empty graph data
    ClearGraphData,

    /// Resize the viewport
    Resize { width: u32, height: u32 },

    /// Run an explicit coordination cycle
    Coordinate {
        #[serde(default)]
        options: CoordinateOptions,
    },

    /// Bind a fresh graph instance
    BindGraph { nodes: usize },
}

/// Outcome of replaying a scenario
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub name: String,
    pub ended_at_ms: u64,
    pub entries: Vec<TimelineEntry>,
    pub metrics: CoordinatorMetrics,
    pub state: CoordinatorState,
    pub completion_callbacks: u64,
}

/// Step `clock` forward to `at`, firing each timer at its own due time
pub fn step_until(coordinator: &mut Coordinator, clock: &ManualClock, at: Duration) -> usize {
    let mut fired = 0;
    while let Some(due) = coordinator.next_due().filter(|due| *due <= at) {
        clock.set(due);
        fired += coordinator.advance();
    }
    clock.set(at);
    fired + coordinator.advance()
}

struct Rig {
    timeline: Timeline,
    resize: ResizeTrigger,
    callbacks: Arc<AtomicU64>,
    options: InitOptions,
}

impl Scenario {
    /// Load a scenario from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Scenario::load: called");
        let content = fs::read_to_string(path).context(format!("Failed to read scenario {}", path.display()))?;
        Self::from_yaml(&content).context(format!("Failed to parse scenario {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let scenario: Self = serde_yaml::from_str(content)?;
        Ok(scenario)
    }

    fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "scenario".to_string())
    }

    fn sorted_steps(&self) -> Vec<Step> {
        let mut steps = self.steps.clone();
        steps.sort_by_key(|s| s.at_ms);
        steps
    }

    fn end_ms(&self) -> u64 {
        let last = self.steps.iter().map(|s| s.at_ms).max().unwrap_or(0);
        self.run_until_ms.unwrap_or(last + 5000).max(last)
    }

    fn effective_config(&self, config: &CoordinatorConfig) -> CoordinatorConfig {
        self.coordinator.clone().unwrap_or_else(|| config.clone())
    }

    fn rig(&self, config: CoordinatorConfig, timeline: Timeline) -> Rig {
        let mut layout = RecordingLayout::new(timeline.clone()).failing(self.layout_failures);
        let mut camera = RecordingCamera::new(timeline.clone()).failing(self.camera_failures);
        if self.write_back {
            layout = layout.with_write_back();
            camera = camera.with_write_back();
        }
        let resize = camera.resize_trigger();

        let callbacks = Arc::new(AtomicU64::new(0));
        let counter = callbacks.clone();
        let mut options = InitOptions::new(config)
            .layout(layout)
            .camera(camera)
            .on_coordination_complete(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        if self.bind_graph {
            options = options.graph(SimGraph::new(GraphData::with_nodes(self.initial_nodes)));
        }

        Rig {
            timeline,
            resize,
            callbacks,
            options,
        }
    }

    /// Replay instantly against a manual clock
    pub fn run(&self, config: &CoordinatorConfig) -> SimReport {
        info!(name = %self.display_name(), steps = self.steps.len(), "Replaying scenario");
        let clock = ManualClock::new();
        let rig = self.rig(self.effective_config(config), Timeline::new(clock.clone()));
        let mut coordinator = Coordinator::init(rig.options.clock(clock.clone()));

        for step in self.sorted_steps() {
            step_until(&mut coordinator, &clock, Duration::from_millis(step.at_ms));
            debug!(at_ms = step.at_ms, action = ?step.action, "Scenario::run: applying step");
            match step.action {
                Action::MoveCamera { position, look_at } => {
                    coordinator.set_camera_position(CameraPose::new(position, look_at));
                }
                Action::SetGraphData { nodes } => {
                    coordinator.set_graph_data(GraphData::with_nodes(nodes));
                }
                Action::ClearGraphData => {
                    coordinator.set_graph_data(GraphData::default());
                }
                Action::Resize { width, height } => {
                    if !rig.resize.resize(ViewportChange { width, height }) {
                        warn!(at_ms = step.at_ms, "Resize before any graph was bound, ignored");
                    }
                    coordinator.process_mutations();
                }
                Action::Coordinate { options } => {
                    coordinator.coordinate(options);
                }
                Action::BindGraph { nodes } => {
                    coordinator.set_graph(Box::new(SimGraph::new(GraphData::with_nodes(nodes))));
                }
            }
        }

        let end = self.end_ms();
        step_until(&mut coordinator, &clock, Duration::from_millis(end));

        SimReport {
            name: self.display_name(),
            ended_at_ms: end,
            entries: rig.timeline.entries(),
            metrics: coordinator.metrics(),
            state: coordinator.state().clone(),
            completion_callbacks: rig.callbacks.load(Ordering::SeqCst),
        }
    }

    /// Replay in real time through the coordinator task
    pub async fn run_live(&self, config: &CoordinatorConfig) -> Result<SimReport> {
        info!(name = %self.display_name(), steps = self.steps.len(), "Replaying scenario in real time");
        let clock = TokioClock::new();
        let rig = self.rig(self.effective_config(config), Timeline::new(clock));
        let coordinator = Coordinator::init(rig.options.clock(clock));
        let (handle, task) = spawn(coordinator, DEFAULT_CHANNEL_BUFFER);

        for step in self.sorted_steps() {
            tokio::time::sleep_until(clock.origin() + Duration::from_millis(step.at_ms)).await;
            debug!(at_ms = step.at_ms, action = ?step.action, "Scenario::run_live: applying step");
            apply_live(&handle, &rig.resize, step.action).await?;
        }

        let end = self.end_ms();
        tokio::time::sleep_until(clock.origin() + Duration::from_millis(end)).await;

        let metrics = handle.metrics().await?;
        let state = handle.state().await?;
        handle.shutdown().await?;
        task.await.context("Coordinator task failed")?;

        Ok(SimReport {
            name: self.display_name(),
            ended_at_ms: end,
            entries: rig.timeline.entries(),
            metrics,
            state,
            completion_callbacks: rig.callbacks.load(Ordering::SeqCst),
        })
    }
}

async fn apply_live(handle: &CoordinatorHandle, resize: &ResizeTrigger, action: Action) -> Result<()> {
    match action {
        Action::MoveCamera { position, look_at } => handle.set_camera_position(CameraPose::new(position, look_at)).await,
        Action::SetGraphData { nodes } => handle.set_graph_data(GraphData::with_nodes(nodes)).await,
        Action::ClearGraphData => handle.set_graph_data(GraphData::default()).await,
        Action::Resize { width, height } => {
            if !resize.resize(ViewportChange { width, height }) {
                warn!("Resize before any graph was bound, ignored");
            }
            Ok(())
        }
        Action::Coordinate { options } => handle.coordinate(options).await,
        Action::BindGraph { nodes } => handle.set_graph(SimGraph::new(GraphData::with_nodes(nodes))).await,
    }
}
