//! Mutation interception
//!
//! The graph instance emits no change events of its own. [`InterceptedGraph`]
//! owns it, delegates every call, and after each genuine write reports a
//! [`Mutation`] on the coordinator's channel. Reports carry the binding
//! generation they were made under, so reports from a replaced graph are
//! recognizable and dropped, and the clock time they were made at, so a
//! report handled late is still acted on as of when it happened.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::clock::Clock;
use crate::graph::{CameraPose, GraphData, GraphView, ViewportChange};

/// A change observed on the bound graph
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Camera pose was written
    CameraMoved(CameraPose),

    /// Non-empty graph data was written
    DataChanged { nodes: usize, links: usize },

    /// Viewport was resized (not a pose write)
    ViewportChanged(ViewportChange),
}

/// A mutation tagged with the binding it was observed under
#[derive(Debug, Clone)]
pub(crate) struct Report {
    pub(crate) binding: u64,
    /// Clock time the mutation was observed
    pub(crate) at: Duration,
    pub(crate) mutation: Mutation,
}

/// Sending side of the coordinator's mutation channel for one binding
#[derive(Clone)]
pub(crate) struct MutationSink {
    binding: u64,
    clock: Arc<dyn Clock>,
    tx: mpsc::UnboundedSender<Report>,
}

impl std::fmt::Debug for MutationSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationSink").field("binding", &self.binding).finish()
    }
}

impl MutationSink {
    pub(crate) fn new(binding: u64, clock: Arc<dyn Clock>, tx: mpsc::UnboundedSender<Report>) -> Self {
        Self { binding, clock, tx }
    }

    fn report(&self, mutation: Mutation) {
        let at = self.clock.now();
        debug!(binding = self.binding, ?at, ?mutation, "MutationSink::report");
        // The coordinator holds the receiver for its whole lifetime
        let _ = self.tx.send(Report {
            binding: self.binding,
            at,
            mutation,
        });
    }
}

/// Handle a camera controller calls when the viewport changes size
#[derive(Debug, Clone)]
pub struct ViewportObserver {
    sink: MutationSink,
}

impl ViewportObserver {
    pub fn notify(&self, change: ViewportChange) {
        debug!(?change, "ViewportObserver::notify: called");
        self.sink.report(Mutation::ViewportChanged(change));
    }
}

/// A graph instance whose writes are reported to the coordinator
pub struct InterceptedGraph {
    inner: Box<dyn GraphView>,
    sink: MutationSink,
}

impl InterceptedGraph {
    pub(crate) fn new(inner: Box<dyn GraphView>, sink: MutationSink) -> Self {
        debug!(graph_id = %inner.id(), binding = sink.binding, "InterceptedGraph::new: called");
        Self { inner, sink }
    }

    pub fn id(&self) -> &str {
        self.inner.id()
    }

    /// Binding generation this wrapper reports under
    pub fn binding(&self) -> u64 {
        self.sink.binding
    }

    /// Read graph data (no side effect)
    pub fn graph_data(&self) -> &GraphData {
        self.inner.graph_data()
    }

    /// Write graph data; reported only when the new data is non-empty
    pub fn set_graph_data(&mut self, data: GraphData) {
        debug!(nodes = data.nodes.len(), links = data.links.len(), "InterceptedGraph::set_graph_data: called");
        let empty = data.is_empty();
        let (nodes, links) = (data.nodes.len(), data.links.len());
        self.inner.set_graph_data(data);

        if empty {
            debug!("InterceptedGraph::set_graph_data: empty data, not reporting");
            return;
        }
        self.sink.report(Mutation::DataChanged { nodes, links });
    }

    /// Read camera pose (no side effect)
    pub fn camera_position(&self) -> Option<CameraPose> {
        self.inner.camera_position()
    }

    /// Write camera pose and report it
    pub fn set_camera_position(&mut self, pose: CameraPose) {
        debug!(?pose, "InterceptedGraph::set_camera_position: called");
        self.inner.set_camera_position(pose);
        self.sink.report(Mutation::CameraMoved(pose));
    }

    /// Observer that reports viewport changes under this binding
    pub fn viewport_observer(&self) -> ViewportObserver {
        ViewportObserver {
            sink: self.sink.clone(),
        }
    }
}
