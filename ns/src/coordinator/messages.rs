//! Message types for the coordinator task

use serde::Serialize;
use tokio::sync::oneshot;

use crate::graph::{CameraPose, GraphData, GraphView};

use super::options::CoordinateOptions;
use super::state::CoordinatorState;

/// Requests to the coordinator task
pub enum CoordRequest {
    /// Write the camera pose through the intercepted graph
    SetCameraPosition { pose: CameraPose },

    /// Write graph data through the intercepted graph
    SetGraphData { data: GraphData },

    /// Run an explicit coordination cycle
    Coordinate { options: CoordinateOptions },

    /// Bind a replacement graph instance
    SetGraph { graph: Box<dyn GraphView> },

    /// Get current metrics
    GetMetrics {
        reply_tx: oneshot::Sender<CoordinatorMetrics>,
    },

    /// Get a snapshot of the coordinator state
    GetState {
        reply_tx: oneshot::Sender<CoordinatorState>,
    },

    /// Shutdown the coordinator
    Shutdown,
}

impl std::fmt::Debug for CoordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordRequest::SetCameraPosition { pose } => f.debug_struct("SetCameraPosition").field("pose", pose).finish(),
            CoordRequest::SetGraphData { data } => f
                .debug_struct("SetGraphData")
                .field("nodes", &data.nodes.len())
                .field("links", &data.links.len())
                .finish(),
            CoordRequest::Coordinate { options } => f.debug_struct("Coordinate").field("options", options).finish(),
            CoordRequest::SetGraph { graph } => f.debug_struct("SetGraph").field("graph_id", &graph.id()).finish(),
            CoordRequest::GetMetrics { .. } => f.write_str("GetMetrics"),
            CoordRequest::GetState { .. } => f.write_str("GetState"),
            CoordRequest::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Coordinator metrics for observability
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoordinatorMetrics {
    /// `improve_separation` attempts, successful or not
    pub layout_corrections: u64,
    /// `fit_all_nodes` attempts, successful or not
    pub camera_corrections: u64,
    /// Layout corrections skipped because the camera moved again
    pub stale_aborts: u64,
    /// Camera movements that did not schedule a layout correction
    pub cooldown_skips: u64,
    /// Mutations ignored because a cycle held control
    pub suppressed_mutations: u64,
    /// Reactive timers that fired during a cycle and were skipped
    pub suppressed_corrections: u64,
    /// Mutations dropped because they came from a replaced graph
    pub stale_bindings: u64,
    pub collaborator_failures: u64,
    pub cycles_completed: u64,
    pub pending_timers: usize,
    /// Deferred tasks scheduled, including ones later skipped
    pub timers_scheduled: u64,
    /// Deferred tasks that came due, whether or not their guard let them run
    pub timers_fired: u64,
    pub peak_pending_timers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Vec3;

    #[test]
    fn test_request_debug_omits_payloads() {
        let req = CoordRequest::SetGraphData {
            data: GraphData::with_nodes(10),
        };
        let text = format!("{:?}", req);
        assert!(text.contains("nodes: 10"));
        assert!(!text.contains("node-3"));

        let req = CoordRequest::SetCameraPosition {
            pose: CameraPose::new(Vec3::ZERO, Vec3::ZERO),
        };
        assert!(format!("{:?}", req).starts_with("SetCameraPosition"));
    }

    #[test]
    fn test_metrics_serialization() {
        let metrics = CoordinatorMetrics {
            stale_aborts: 2,
            ..Default::default()
        };
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["stale_aborts"], 2);
        assert_eq!(json["cycles_completed"], 0);
    }
}
