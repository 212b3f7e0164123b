//! navshell - Layout and camera coordination for a 3D node-link navigation shell
//!
//! The portfolio site is navigated through a force-directed graph. Two external
//! subsystems mutate it continuously: the layout engine owns node positions and
//! the camera controller owns the viewing pose. Left alone, each one's corrections
//! trigger the other's, and the view oscillates. The [`Coordinator`] sits between
//! them and keeps them consistent without feedback loops.
//!
//! # Core Concepts
//!
//! - **Interception**: all writes go through an [`InterceptedGraph`] that reports them
//! - **Deferred Corrections**: reactions are fire-once timers, never immediate calls
//! - **Debounce-by-Staleness**: a timer re-checks its trigger at fire time and aborts if superseded
//! - **Exclusive Cycles**: an explicit `coordinate()` suppresses every reactive handler
//!
//! # Modules
//!
//! - [`graph`] - Graph data types and the collaborator traits
//! - [`intercept`] - Mutation-reporting wrapper around a graph instance
//! - [`scheduler`] - Fire-once timer queue
//! - [`coordinator`] - The coordination state machine and its async driver
//! - [`sim`] - Recording collaborators and scripted scenarios
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod graph;
pub mod intercept;
pub mod scheduler;
pub mod sim;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, TokioClock};
pub use config::Config;
pub use coordinator::{
    CameraOptions, CompletionCallback, CoordRequest, CoordinateOptions, Coordinator, CoordinatorConfig,
    CoordinatorHandle, CoordinatorMetrics, CoordinatorState, InitOptions, LayoutOptions, spawn,
};
pub use graph::{
    CameraController, CameraPose, CollaboratorError, GraphData, GraphView, LayoutEngine, Link, Node, Vec3,
    ViewportChange,
};
pub use intercept::{InterceptedGraph, Mutation, ViewportObserver};
pub use scheduler::{Timer, TimerId, TimerQueue, TimerStats};
pub use sim::{
    Call, RecordingCamera, RecordingLayout, ResizeTrigger, Scenario, SimGraph, SimReport, Timeline, TimelineEntry,
};
