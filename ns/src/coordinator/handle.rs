//! CoordinatorHandle - Client interface to the coordinator task

use eyre::{Result, eyre};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::graph::{CameraPose, GraphData, GraphView};

use super::messages::{CoordRequest, CoordinatorMetrics};
use super::options::CoordinateOptions;
use super::state::CoordinatorState;

/// Handle for application code to drive the coordinator task
///
/// Cloneable; every clone talks to the same task.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<CoordRequest>,
}

impl CoordinatorHandle {
    pub(crate) fn new(tx: mpsc::Sender<CoordRequest>) -> Self {
        Self { tx }
    }

    async fn send(&self, req: CoordRequest) -> Result<()> {
        self.tx.send(req).await.map_err(|_| eyre!("Coordinator channel closed"))
    }

    /// Write the camera pose through the intercepted graph
    pub async fn set_camera_position(&self, pose: CameraPose) -> Result<()> {
        debug!(?pose, "CoordinatorHandle::set_camera_position: called");
        self.send(CoordRequest::SetCameraPosition { pose }).await
    }

    /// Write graph data through the intercepted graph
    pub async fn set_graph_data(&self, data: GraphData) -> Result<()> {
        debug!(nodes = data.nodes.len(), "CoordinatorHandle::set_graph_data: called");
        self.send(CoordRequest::SetGraphData { data }).await
    }

    /// Start an explicit coordination cycle
    pub async fn coordinate(&self, options: CoordinateOptions) -> Result<()> {
        debug!(?options, "CoordinatorHandle::coordinate: called");
        self.send(CoordRequest::Coordinate { options }).await
    }

    /// Bind a replacement graph instance
    pub async fn set_graph(&self, graph: impl GraphView + 'static) -> Result<()> {
        debug!(graph_id = %graph.id(), "CoordinatorHandle::set_graph: called");
        self.send(CoordRequest::SetGraph { graph: Box::new(graph) }).await
    }

    /// Get current metrics
    pub async fn metrics(&self) -> Result<CoordinatorMetrics> {
        debug!("CoordinatorHandle::metrics: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CoordRequest::GetMetrics { reply_tx }).await?;
        reply_rx.await.map_err(|_| eyre!("Coordinator dropped metrics request"))
    }

    /// Get a snapshot of the coordinator state
    pub async fn state(&self) -> Result<CoordinatorState> {
        debug!("CoordinatorHandle::state: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CoordRequest::GetState { reply_tx }).await?;
        reply_rx.await.map_err(|_| eyre!("Coordinator dropped state request"))
    }

    /// Request shutdown of the coordinator task
    pub async fn shutdown(&self) -> Result<()> {
        debug!("CoordinatorHandle::shutdown: called");
        self.send(CoordRequest::Shutdown).await
    }
}
