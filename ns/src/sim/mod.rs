//! Simulation collaborators and scripted scenarios
//!
//! Stand-ins for the browser-side graph, layout engine and camera controller.
//! They record every call into a shared [`Timeline`] so a scenario's correction
//! history can be inspected, printed, or asserted on.

mod recorder;
mod scenario;

pub use recorder::{Call, RecordingCamera, RecordingLayout, ResizeTrigger, SimGraph, Timeline, TimelineEntry};
pub use scenario::{Action, Scenario, SimReport, Step, step_until};
