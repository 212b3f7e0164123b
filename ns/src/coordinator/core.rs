//! Main Coordinator implementation

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::clock::{Clock, TokioClock};
use crate::graph::{CameraController, CameraPose, GraphData, GraphView, LayoutEngine};
use crate::intercept::{InterceptedGraph, Mutation, MutationSink, Report};
use crate::scheduler::{TimerId, TimerQueue};

use super::config::CoordinatorConfig;
use super::messages::CoordinatorMetrics;
use super::options::{CameraOptions, CompletionCallback, CoordinateOptions, InitOptions};
use super::state::{CoordinatorState, Guard, Verdict};

/// What a deferred timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq)]
enum Task {
    /// Reactive layout correction
    Layout { maintain_hierarchy: bool, cause: Cause },

    /// Reactive camera refit after a data change
    Camera { options: CameraOptions },

    /// Camera step of an explicit cycle; ends the cycle
    FinishCycle { options: CameraOptions },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cause {
    CameraMoved,
    ViewportChanged,
}

#[derive(Debug)]
struct Deferred {
    task: Task,
    guard: Guard,
}

/// Keeps the layout engine and the camera controller consistent
///
/// Single-threaded: every entry point takes `&mut self`, and deferred work only
/// runs from [`Coordinator::advance`]. Writes made through the bound
/// [`InterceptedGraph`] are queued as reports and handled synchronously at the
/// end of whichever entry point caused them.
pub struct Coordinator {
    config: CoordinatorConfig,
    clock: Arc<dyn Clock>,
    graph: Option<InterceptedGraph>,
    layout: Option<Box<dyn LayoutEngine>>,
    camera: Option<Box<dyn CameraController>>,
    on_complete: Option<CompletionCallback>,
    state: CoordinatorState,
    timers: TimerQueue<Deferred>,
    reports_tx: mpsc::UnboundedSender<Report>,
    reports_rx: mpsc::UnboundedReceiver<Report>,
    /// Generation of the current graph binding
    binding: u64,
    /// When the event being handled happened (a firing timer's due time or a
    /// report's stamp); stands in for the clock while it is handled
    acting_at: Option<Duration>,
    metrics: CoordinatorMetrics,
}

impl Coordinator {
    /// Build a coordinator from injected collaborators
    ///
    /// If no graph is supplied, interception is deferred until [`Coordinator::set_graph`].
    pub fn init(options: InitOptions) -> Self {
        debug!(config = ?options.config, "Coordinator::init: called");
        let InitOptions {
            config,
            graph,
            layout,
            camera,
            clock,
            on_coordination_complete,
        } = options;

        if layout.is_none() {
            warn!("Coordinator::init: no layout engine supplied, layout corrections are disabled");
        }
        if camera.is_none() {
            warn!("Coordinator::init: no camera controller supplied, camera corrections are disabled");
        }

        let (reports_tx, reports_rx) = mpsc::unbounded_channel();
        let mut coordinator = Self {
            config,
            clock: clock.unwrap_or_else(|| Arc::new(TokioClock::new())),
            graph: None,
            layout,
            camera,
            on_complete: on_coordination_complete,
            state: CoordinatorState::default(),
            timers: TimerQueue::new(),
            reports_tx,
            reports_rx,
            binding: 0,
            acting_at: None,
            metrics: CoordinatorMetrics::default(),
        };

        match graph {
            Some(graph) => {
                coordinator.set_graph(graph);
            }
            None => debug!("Coordinator::init: no graph yet, interception deferred"),
        }

        info!("Coordinator initialized");
        coordinator
    }

    /// Bind a graph instance, replacing any previous one
    ///
    /// Installs interception and the viewport observer on the new instance.
    /// Timestamps and pending timers carry over.
    pub fn set_graph(&mut self, graph: Box<dyn GraphView>) -> &mut Self {
        debug!(graph_id = %graph.id(), "Coordinator::set_graph: called");
        // Reports already queued belong to the graph that made them
        self.process_mutations();

        self.binding += 1;
        let intercepted = InterceptedGraph::new(graph, MutationSink::new(self.binding, self.clock.clone(), self.reports_tx.clone()));

        match self.camera.as_mut() {
            Some(camera) => camera.setup_viewport_observer(&intercepted, intercepted.viewport_observer()),
            None => warn!("Coordinator::set_graph: no camera controller, viewport changes will not be observed"),
        }

        let graph_id = intercepted.id().to_string();
        if let Some(previous) = self.graph.replace(intercepted) {
            debug!(previous_id = %previous.id(), "Coordinator::set_graph: released previous graph");
        }

        info!(%graph_id, binding = self.binding, "Graph bound");
        self
    }

    /// Run an explicit coordination cycle
    ///
    /// Corrects the layout now, then the camera after the camera adjustment delay.
    /// Reactive handlers stay suppressed until the camera step has run.
    pub fn coordinate(&mut self, options: CoordinateOptions) -> &mut Self {
        debug!(?options, "Coordinator::coordinate: called");
        if self.graph.is_none() {
            warn!("Coordinator::coordinate: no graph bound, nothing to coordinate");
            return self;
        }

        // Anything observed before the cycle is handled outside it
        self.process_mutations();

        self.state.begin_cycle();
        self.note("coordination cycle started");

        self.correct_layout(options.layout.maintain_hierarchy);
        self.schedule(
            self.config.camera_adjustment_delay(),
            Task::FinishCycle { options: options.camera },
            Guard::Always,
        );
        self
    }

    /// Write the camera pose through the bound graph
    pub fn set_camera_position(&mut self, pose: CameraPose) -> &mut Self {
        debug!(?pose, "Coordinator::set_camera_position: called");
        if self.with_graph(|graph| graph.set_camera_position(pose)).is_none() {
            warn!("Coordinator::set_camera_position: no graph bound, ignoring");
        }
        self
    }

    /// Write graph data through the bound graph
    pub fn set_graph_data(&mut self, data: GraphData) -> &mut Self {
        debug!(nodes = data.nodes.len(), "Coordinator::set_graph_data: called");
        if self.with_graph(|graph| graph.set_graph_data(data)).is_none() {
            warn!("Coordinator::set_graph_data: no graph bound, ignoring");
        }
        self
    }

    /// Run `f` against the bound graph, then handle whatever it mutated
    pub fn with_graph<R>(&mut self, f: impl FnOnce(&mut InterceptedGraph) -> R) -> Option<R> {
        let result = self.graph.as_mut().map(f);
        self.process_mutations();
        result
    }

    /// Fire every timer that is due
    ///
    /// Each timer runs as if at its own due time, so stepping the clock past
    /// several timers at once gives the same outcome as firing them one by one.
    pub fn advance(&mut self) -> usize {
        self.process_mutations();

        let mut fired = 0;
        while let Some(timer) = self.timers.pop_due(self.clock.now()) {
            self.acting_at = Some(timer.due);
            self.fire(timer.id, timer.task);
            self.acting_at = None;
            fired += 1;
        }

        if fired > 0 {
            debug!(fired, pending = self.timers.len(), "Coordinator::advance: fired timers");
        }
        fired
    }

    /// Handle every queued mutation report
    ///
    /// Each report is handled as of the clock time it was made, so a report
    /// queued outside any entry point (a viewport resize) and picked up by a
    /// later call is scheduled from when it happened.
    pub fn process_mutations(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(report) = self.reports_rx.try_recv() {
            self.dispatch(report);
            handled += 1;
        }
        handled
    }

    /// Wait for the next mutation report (for reports made outside any entry point)
    pub(crate) async fn recv_report(&mut self) -> Option<Report> {
        self.reports_rx.recv().await
    }

    pub(crate) fn dispatch(&mut self, report: Report) {
        if report.binding != self.binding {
            debug!(
                report_binding = report.binding,
                current = self.binding,
                "Coordinator::dispatch: report from a replaced graph, dropping"
            );
            self.metrics.stale_bindings += 1;
            return;
        }

        // Side effects of a firing timer belong to the timer's instant
        let outer = self.acting_at;
        self.acting_at = Some(outer.unwrap_or(report.at));

        match report.mutation {
            Mutation::CameraMoved(pose) => self.on_camera_moved(pose),
            Mutation::DataChanged { nodes, links } => self.on_graph_data_changed(nodes, links),
            Mutation::ViewportChanged(change) => {
                debug!(?change, "Coordinator::dispatch: viewport changed");
                self.on_viewport_changed();
            }
        }

        self.acting_at = outer;
    }

    fn on_camera_moved(&mut self, pose: CameraPose) {
        self.state.current_camera_pose = Some(pose);
        if self.state.coordinating {
            self.metrics.suppressed_mutations += 1;
            self.note("camera moved during cycle, suppressed");
            return;
        }

        let now = self.now();
        self.state.last_camera_movement = Some(now);

        if !self.config.auto_adjust_layout {
            return;
        }
        if !self.state.layout_cooled_down(now, self.config.layout_cooldown()) {
            self.metrics.cooldown_skips += 1;
            self.note("camera moved within layout cooldown, no correction");
            return;
        }

        self.schedule(
            self.config.layout_adjustment_delay(),
            Task::Layout {
                maintain_hierarchy: true,
                cause: Cause::CameraMoved,
            },
            Guard::IdleAndCameraSettled,
        );
    }

    fn on_graph_data_changed(&mut self, nodes: usize, links: usize) {
        if self.state.coordinating {
            self.metrics.suppressed_mutations += 1;
            self.note("graph data changed during cycle, suppressed");
            return;
        }

        debug!(nodes, links, "Coordinator::on_graph_data_changed: called");
        self.state.last_layout_change = Some(self.now());

        if self.config.auto_adjust_camera {
            self.schedule(
                self.config.camera_adjustment_delay(),
                Task::Camera {
                    options: CameraOptions::default(),
                },
                Guard::Idle,
            );
        }
    }

    /// Resizes skip the cooldown and still run while a cycle holds control
    fn on_viewport_changed(&mut self) {
        if self.config.auto_adjust_layout {
            self.schedule(
                self.config.layout_adjustment_delay(),
                Task::Layout {
                    maintain_hierarchy: true,
                    cause: Cause::ViewportChanged,
                },
                Guard::Always,
            );
        }
    }

    fn fire(&mut self, id: TimerId, deferred: Deferred) {
        let now = self.now();
        match self.state.check(deferred.guard, now, self.config.camera_settle_window()) {
            Verdict::Fire => {}
            Verdict::Suppressed => {
                self.metrics.suppressed_corrections += 1;
                self.note("reactive correction fired during cycle, skipped");
                return;
            }
            Verdict::Stale => {
                self.metrics.stale_aborts += 1;
                self.note("camera moved again since scheduling, layout correction aborted");
                return;
            }
        }

        debug!(?id, task = ?deferred.task, "Coordinator::fire: running");
        match deferred.task {
            Task::Layout {
                maintain_hierarchy,
                cause,
            } => {
                debug!(?cause, "Coordinator::fire: reactive layout correction");
                self.correct_layout(maintain_hierarchy);
            }
            Task::Camera { options } => self.correct_camera(options),
            Task::FinishCycle { options } => {
                self.correct_camera(options);
                self.finish_cycle();
            }
        }
    }

    fn correct_layout(&mut self, maintain_hierarchy: bool) {
        let now = self.now();
        let (Some(layout), Some(graph)) = (self.layout.as_mut(), self.graph.as_mut()) else {
            warn!("Coordinator: no layout engine or graph bound, skipping layout correction");
            return;
        };

        self.metrics.layout_corrections += 1;
        if let Err(e) = layout.improve_separation(graph, maintain_hierarchy) {
            warn!(error = %e, maintain_hierarchy, "Layout correction failed");
            self.metrics.collaborator_failures += 1;
        }

        // Pacing advances whether or not the attempt succeeded
        self.state.last_layout_change = Some(now);
        self.process_mutations();
    }

    fn correct_camera(&mut self, options: CameraOptions) {
        let now = self.now();
        let (Some(camera), Some(graph)) = (self.camera.as_mut(), self.graph.as_mut()) else {
            warn!("Coordinator: no camera controller or graph bound, skipping camera correction");
            return;
        };

        self.metrics.camera_corrections += 1;
        if let Err(e) = camera.fit_all_nodes(graph, options.duration(), options.maintain_angle) {
            warn!(error = %e, ?options, "Camera correction failed");
            self.metrics.collaborator_failures += 1;
        }

        self.state.last_camera_movement = Some(now);
        self.process_mutations();
    }

    fn finish_cycle(&mut self) {
        self.state.end_cycle();
        self.metrics.cycles_completed += 1;
        self.note("coordination cycle complete");

        if let Some(callback) = self.on_complete.as_mut() {
            callback();
        }
    }

    fn schedule(&mut self, delay: Duration, task: Task, guard: Guard) -> TimerId {
        let now = self.now();
        let id = self.timers.schedule(now, delay, Deferred { task, guard });
        debug!(?id, ?task, ?delay, "Coordinator::schedule: deferred");
        id
    }

    fn note(&self, decision: &str) {
        if self.config.debug {
            info!(now = ?self.now(), "Coordinator: {}", decision);
        } else {
            debug!(now = ?self.now(), "Coordinator: {}", decision);
        }
    }

    /// Current time, or when the event being handled happened
    pub fn now(&self) -> Duration {
        self.acting_at.unwrap_or_else(|| self.clock.now())
    }

    /// Due time of the next pending timer
    pub fn next_due(&self) -> Option<Duration> {
        self.timers.next_due()
    }

    /// How long until the next timer is due (zero if overdue)
    pub fn time_until_next_due(&self) -> Option<Duration> {
        self.next_due().map(|due| due.saturating_sub(self.clock.now()))
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn graph(&self) -> Option<&InterceptedGraph> {
        self.graph.as_ref()
    }

    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn metrics(&self) -> CoordinatorMetrics {
        let stats = self.timers.stats();
        CoordinatorMetrics {
            pending_timers: self.timers.len(),
            timers_scheduled: stats.total_scheduled,
            timers_fired: stats.total_fired,
            peak_pending_timers: stats.peak_pending,
            ..self.metrics.clone()
        }
    }
}
