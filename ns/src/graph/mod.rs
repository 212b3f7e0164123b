//! Graph data and the external collaborators the coordinator drives
//!
//! The graph instance, the layout engine and the camera controller are all owned
//! outside this crate. They are reached only through the traits defined here.

mod error;
mod traits;
mod types;

pub use error::CollaboratorError;
pub use traits::{CameraController, GraphView, LayoutEngine};
pub use types::{CameraPose, GraphData, Link, Node, Vec3, ViewportChange};
