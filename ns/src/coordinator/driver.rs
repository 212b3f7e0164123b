//! Coordinator task
//!
//! Moves a [`Coordinator`] into a single tokio task that owns it exclusively. The
//! task waits on three things at once: requests from handles, mutation reports
//! made outside any request (viewport resizes), and the next timer's due time.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::intercept::Report;

use super::core::Coordinator;
use super::handle::CoordinatorHandle;
use super::messages::CoordRequest;

/// Default request channel capacity
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

enum Wake {
    Request(Option<CoordRequest>),
    Report(Option<Report>),
    TimerDue,
}

/// Spawn the coordinator task and return a handle to it
pub fn spawn(coordinator: Coordinator, buffer: usize) -> (CoordinatorHandle, JoinHandle<()>) {
    debug!(buffer, "spawn: called");
    let (tx, rx) = mpsc::channel(buffer);
    let task = tokio::spawn(run(coordinator, rx));
    (CoordinatorHandle::new(tx), task)
}

/// Run the coordinator until shutdown is requested or every handle is dropped
pub async fn run(mut coordinator: Coordinator, mut rx: mpsc::Receiver<CoordRequest>) {
    info!("Coordinator task started");

    loop {
        let wait = coordinator.time_until_next_due();

        let wake = tokio::select! {
            req = rx.recv() => Wake::Request(req),
            report = coordinator.recv_report() => Wake::Report(report),
            _ = tokio::time::sleep(wait.unwrap_or_default()), if wait.is_some() => Wake::TimerDue,
        };

        match wake {
            Wake::Request(None) => {
                debug!("run: all handles dropped");
                break;
            }
            Wake::Request(Some(CoordRequest::Shutdown)) => {
                debug!("run: shutdown requested");
                break;
            }
            Wake::Request(Some(req)) => handle_request(&mut coordinator, req),
            Wake::Report(Some(report)) => {
                coordinator.dispatch(report);
                coordinator.process_mutations();
            }
            Wake::Report(None) => {}
            Wake::TimerDue => {
                coordinator.advance();
            }
        }
    }

    info!(metrics = ?coordinator.metrics(), "Coordinator task stopped");
}

fn handle_request(coordinator: &mut Coordinator, req: CoordRequest) {
    debug!(?req, "handle_request: called");
    match req {
        CoordRequest::SetCameraPosition { pose } => {
            coordinator.set_camera_position(pose);
        }
        CoordRequest::SetGraphData { data } => {
            coordinator.set_graph_data(data);
        }
        CoordRequest::Coordinate { options } => {
            coordinator.coordinate(options);
        }
        CoordRequest::SetGraph { graph } => {
            coordinator.set_graph(graph);
        }
        CoordRequest::GetMetrics { reply_tx } => {
            let _ = reply_tx.send(coordinator.metrics());
        }
        CoordRequest::GetState { reply_tx } => {
            let _ = reply_tx.send(coordinator.state().clone());
        }
        CoordRequest::Shutdown => {}
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clock::TokioClock;
    use crate::coordinator::{CoordinateOptions, CoordinatorConfig, InitOptions};
    use crate::graph::{CameraPose, GraphData, Vec3, ViewportChange};
    use crate::sim::{Call, RecordingCamera, RecordingLayout, SimGraph, Timeline};

    fn start(timeline: &Timeline, camera: RecordingCamera) -> (CoordinatorHandle, JoinHandle<()>) {
        let coordinator = Coordinator::init(
            InitOptions::new(CoordinatorConfig::default())
                .graph(SimGraph::new(GraphData::with_nodes(5)))
                .layout(RecordingLayout::new(timeline.clone()))
                .camera(camera)
                .clock(TokioClock::new()),
        );
        spawn(coordinator, DEFAULT_CHANNEL_BUFFER)
    }

    #[tokio::test(start_paused = true)]
    async fn test_coordinate_through_handle() {
        let timeline = Timeline::new(TokioClock::new());
        let (handle, task) = start(&timeline, RecordingCamera::new(timeline.clone()));

        handle.coordinate(CoordinateOptions::default()).await.unwrap();
        let state = handle.state().await.unwrap();
        assert!(state.coordinating);

        tokio::time::sleep(Duration::from_millis(600)).await;
        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.layout_corrections, 1);
        assert_eq!(metrics.camera_corrections, 1);
        assert_eq!(metrics.cycles_completed, 1);

        let fit_at: Vec<u64> = timeline
            .entries()
            .into_iter()
            .filter(|e| matches!(e.call, Call::FitAllNodes { .. }))
            .map(|e| e.at_ms)
            .collect();
        assert_eq!(fit_at, vec![500]);

        handle.shutdown().await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_camera_jitter_debounced_through_handle() {
        let timeline = Timeline::new(TokioClock::new());
        let (handle, task) = start(&timeline, RecordingCamera::new(timeline.clone()));

        let pose = CameraPose::new(Vec3::new(0.0, 0.0, 150.0), Vec3::ZERO);
        handle.set_camera_position(pose).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.set_camera_position(pose).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.layout_corrections, 1);
        assert_eq!(metrics.stale_aborts, 1);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_viewport_resize_wakes_task() {
        let timeline = Timeline::new(TokioClock::new());
        let camera = RecordingCamera::new(timeline.clone());
        let resize = camera.resize_trigger();
        let (handle, task) = start(&timeline, camera);

        // Round-trip so the task has bound the graph and installed the observer
        handle.state().await.unwrap();
        assert!(resize.resize(ViewportChange { width: 1024, height: 768 }));
        tokio::time::sleep(Duration::from_millis(400)).await;

        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.layout_corrections, 1);

        drop(handle);
        task.await.unwrap();
    }
}
