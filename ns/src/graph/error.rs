//! Collaborator error types

use thiserror::Error;

/// Errors a layout engine or camera controller may raise during a correction
///
/// The coordinator never propagates these: they are logged and counted.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Layout engine failed: {0}")]
    Layout(String),

    #[error("Camera controller failed: {0}")]
    Camera(String),

    #[error("Graph has no nodes to work with")]
    EmptyGraph,
}
