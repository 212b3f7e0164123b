//! Layout/camera coordinator
//!
//! The Coordinator mediates between two externally-owned subsystems:
//! - **Camera moved:** schedule a debounced layout correction
//! - **Graph data changed:** schedule a camera refit
//! - **Viewport resized:** schedule a layout correction
//!
//! An explicit `coordinate()` cycle takes exclusive control until its deferred
//! camera step has run.

mod config;
mod core;
mod driver;
mod handle;
mod messages;
mod options;
mod state;

pub use config::CoordinatorConfig;
pub use core::Coordinator;
pub use driver::{DEFAULT_CHANNEL_BUFFER, run, spawn};
pub use handle::CoordinatorHandle;
pub use messages::{CoordRequest, CoordinatorMetrics};
pub use options::{CameraOptions, CompletionCallback, CoordinateOptions, InitOptions, LayoutOptions};
pub use state::CoordinatorState;
