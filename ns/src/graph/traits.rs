//! Collaborator traits
//!
//! Writes made by a layout engine or camera controller must go through the
//! [`InterceptedGraph`] they are handed, so the coordinator sees them.

use std::time::Duration;

use crate::intercept::{InterceptedGraph, ViewportObserver};

use super::error::CollaboratorError;
use super::types::{CameraPose, GraphData};

/// A visualization graph instance: node data plus camera pose
///
/// Reads and writes are separate methods, so a read can never be mistaken for a
/// mutation.
pub trait GraphView: Send {
    /// Stable identifier of this graph instance
    fn id(&self) -> &str;

    fn graph_data(&self) -> &GraphData;

    fn set_graph_data(&mut self, data: GraphData);

    fn camera_position(&self) -> Option<CameraPose>;

    fn set_camera_position(&mut self, pose: CameraPose);
}

/// Force-directed layout engine
pub trait LayoutEngine: Send {
    /// Spread overlapping nodes apart, optionally keeping hierarchical groups together
    fn improve_separation(
        &mut self,
        graph: &mut InterceptedGraph,
        maintain_hierarchy: bool,
    ) -> Result<(), CollaboratorError>;
}

/// Camera/viewport controller
pub trait CameraController: Send {
    /// Move the camera so every node is in view
    fn fit_all_nodes(
        &mut self,
        graph: &mut InterceptedGraph,
        duration: Duration,
        maintain_angle: bool,
    ) -> Result<(), CollaboratorError>;

    /// Register an observer to be notified whenever the viewport is resized
    fn setup_viewport_observer(&mut self, graph: &InterceptedGraph, observer: ViewportObserver);
}
