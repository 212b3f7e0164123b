//! Integration tests for navshell
//!
//! These tests drive the coordinator through its public surface: the
//! synchronous state machine, the async handle, config loading and the CLI.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;
use proptest::prelude::*;
use tempfile::{NamedTempFile, TempDir};

use navshell::coordinator::DEFAULT_CHANNEL_BUFFER;
use navshell::sim::step_until;
use navshell::{
    Call, CameraOptions, CameraPose, Config, CoordinateOptions, Coordinator, CoordinatorConfig, GraphData,
    InitOptions, LayoutOptions, ManualClock, RecordingCamera, RecordingLayout, SimGraph, Timeline, TokioClock, Vec3,
    ViewportChange, spawn,
};

// =============================================================================
// Helpers
// =============================================================================

struct Session {
    clock: ManualClock,
    timeline: Timeline,
    coordinator: Coordinator,
}

impl Session {
    fn new(config: CoordinatorConfig, layout_failures: u32, camera_failures: u32) -> Self {
        let clock = ManualClock::new();
        let timeline = Timeline::new(clock.clone());
        let coordinator = Coordinator::init(
            InitOptions::new(config)
                .graph(SimGraph::new(GraphData::with_nodes(10)))
                .layout(RecordingLayout::new(timeline.clone()).failing(layout_failures))
                .camera(RecordingCamera::new(timeline.clone()).failing(camera_failures))
                .clock(clock.clone()),
        );
        Self {
            clock,
            timeline,
            coordinator,
        }
    }

    fn run_until(&mut self, at_ms: u64) {
        step_until(&mut self.coordinator, &self.clock, Duration::from_millis(at_ms));
    }

    fn move_camera_at(&mut self, at_ms: u64, z: f32) {
        self.run_until(at_ms);
        self.coordinator
            .set_camera_position(CameraPose::new(Vec3::new(0.0, 0.0, z), Vec3::ZERO));
    }

    fn layout_times(&self) -> Vec<u64> {
        layout_times(&self.timeline)
    }

    fn fits(&self) -> Vec<(u64, u64, bool, bool)> {
        self.timeline
            .entries()
            .into_iter()
            .filter_map(|e| match e.call {
                Call::FitAllNodes {
                    duration_ms,
                    maintain_angle,
                    failed,
                    ..
                } => Some((e.at_ms, duration_ms, maintain_angle, failed)),
                _ => None,
            })
            .collect()
    }
}

fn layout_times(timeline: &Timeline) -> Vec<u64> {
    timeline
        .entries()
        .into_iter()
        .filter_map(|e| match e.call {
            Call::ImproveSeparation { .. } => Some(e.at_ms),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Coordinator Tests
// =============================================================================

#[test]
fn test_coordinate_runs_layout_now_and_camera_after_delay() {
    let mut session = Session::new(CoordinatorConfig::default(), 0, 0);
    let completions = Arc::new(AtomicUsize::new(0));
    let counter = completions.clone();
    session.coordinator = Coordinator::init(
        InitOptions::new(CoordinatorConfig::default())
            .graph(SimGraph::new(GraphData::with_nodes(10)))
            .layout(RecordingLayout::new(session.timeline.clone()))
            .camera(RecordingCamera::new(session.timeline.clone()))
            .clock(session.clock.clone())
            .on_coordination_complete(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
    );

    session.coordinator.coordinate(CoordinateOptions {
        layout: LayoutOptions {
            maintain_hierarchy: false,
        },
        camera: CameraOptions::default(),
    });

    // Layout correction is synchronous
    let calls: Vec<_> = session
        .timeline
        .entries()
        .into_iter()
        .filter(|e| matches!(e.call, Call::ImproveSeparation { .. }))
        .collect();
    assert_eq!(calls.len(), 1);
    assert!(matches!(
        calls[0].call,
        Call::ImproveSeparation {
            maintain_hierarchy: false,
            ..
        }
    ));
    assert!(session.coordinator.state().coordinating);
    assert!(session.fits().is_empty());

    session.run_until(499);
    assert!(session.fits().is_empty());
    assert!(session.coordinator.state().coordinating);

    session.run_until(500);
    assert_eq!(session.fits(), vec![(500, 800, false, false)]);
    assert!(!session.coordinator.state().coordinating);
    assert_eq!(completions.load(Ordering::SeqCst), 1);
}

#[test]
fn test_coordinate_without_graph_schedules_nothing() {
    let clock = ManualClock::new();
    let timeline = Timeline::new(clock.clone());
    let mut coordinator = Coordinator::init(
        InitOptions::new(CoordinatorConfig::default())
            .layout(RecordingLayout::new(timeline.clone()))
            .camera(RecordingCamera::new(timeline.clone()))
            .clock(clock),
    );

    coordinator.coordinate(CoordinateOptions::default());

    assert_eq!(coordinator.pending_timers(), 0);
    assert!(!coordinator.state().coordinating);
    assert!(timeline.entries().is_empty());
}

#[test]
fn test_two_quick_camera_writes_yield_one_layout_correction() {
    let mut session = Session::new(CoordinatorConfig::default(), 0, 0);

    session.move_camera_at(1000, 100.0);
    session.move_camera_at(1050, 110.0);
    session.run_until(5000);

    assert_eq!(session.layout_times(), vec![1350]);
    assert_eq!(session.coordinator.metrics().stale_aborts, 1);
}

#[test]
fn test_camera_failure_does_not_block_later_corrections() {
    let mut session = Session::new(CoordinatorConfig::default(), 0, 1);

    session.coordinator.set_graph_data(GraphData::with_nodes(20));
    session.run_until(2000);
    session.coordinator.set_graph_data(GraphData::with_nodes(25));
    session.run_until(4000);

    let fits = session.fits();
    assert_eq!(fits.len(), 2);
    assert!(fits[0].3, "first fit should have failed");
    assert!(!fits[1].3, "second fit should have succeeded");
    assert_eq!(fits[1].0, 2500);
    assert_eq!(session.coordinator.metrics().collaborator_failures, 1);
}

#[test]
fn test_layout_failure_does_not_abort_cycle() {
    let mut session = Session::new(CoordinatorConfig::default(), 1, 0);

    session.coordinator.coordinate(CoordinateOptions::default());
    session.run_until(1000);

    assert_eq!(session.fits(), vec![(500, 800, false, false)]);
    let metrics = session.coordinator.metrics();
    assert_eq!(metrics.collaborator_failures, 1);
    assert_eq!(metrics.cycles_completed, 1);
    assert_eq!(session.coordinator.state().last_layout_change, Some(Duration::ZERO));
}

#[test]
fn test_cycle_with_feedback_collaborators_triggers_no_reactive_corrections() {
    let clock = ManualClock::new();
    let timeline = Timeline::new(clock.clone());
    let mut coordinator = Coordinator::init(
        InitOptions::new(CoordinatorConfig::default())
            .graph(SimGraph::new(GraphData::with_nodes(8)))
            .layout(RecordingLayout::new(timeline.clone()).with_write_back())
            .camera(RecordingCamera::new(timeline.clone()).with_write_back())
            .clock(clock.clone()),
    );

    coordinator.coordinate(CoordinateOptions::default());
    step_until(&mut coordinator, &clock, Duration::from_secs(10));

    let metrics = coordinator.metrics();
    assert_eq!(metrics.layout_corrections, 1);
    assert_eq!(metrics.camera_corrections, 1);
    assert_eq!(metrics.cycles_completed, 1);
    assert_eq!(coordinator.pending_timers(), 0);
}

#[test]
fn test_chained_calls_return_coordinator() {
    let mut session = Session::new(CoordinatorConfig::default(), 0, 0);

    session
        .coordinator
        .set_graph(Box::new(SimGraph::new(GraphData::with_nodes(3))))
        .coordinate(CoordinateOptions::default());

    assert_eq!(session.coordinator.graph().map(|g| g.graph_data().nodes.len()), Some(3));
    assert!(session.coordinator.state().coordinating);
}

// =============================================================================
// Debounce Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_spaced_camera_writes_each_correct_once(gaps in prop::collection::vec(1301u64..4000, 1..6)) {
        let mut session = Session::new(CoordinatorConfig::default(), 0, 0);
        let mut at = 0;
        let mut expected = vec![at + 300];
        session.move_camera_at(at, 0.0);
        for gap in &gaps {
            at += gap;
            expected.push(at + 300);
            session.move_camera_at(at, *gap as f32);
        }
        session.run_until(at + 5000);

        prop_assert_eq!(session.layout_times(), expected);
        prop_assert_eq!(session.coordinator.metrics().stale_aborts, 0);
    }

    #[test]
    fn prop_clustered_camera_writes_correct_only_after_last(gaps in prop::collection::vec(1u64..300, 1..8)) {
        let mut session = Session::new(CoordinatorConfig::default(), 0, 0);
        let mut at = 0;
        session.move_camera_at(at, 0.0);
        for gap in &gaps {
            at += gap;
            session.move_camera_at(at, *gap as f32);
        }
        session.run_until(at + 5000);

        prop_assert_eq!(session.layout_times(), vec![at + 300]);
        prop_assert_eq!(session.coordinator.metrics().stale_aborts, gaps.len() as u64);
    }
}

// =============================================================================
// Coordinator Task Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_handle_drives_coordinator_task() {
    let clock = TokioClock::new();
    let timeline = Timeline::new(clock);
    let camera = RecordingCamera::new(timeline.clone());
    let resize = camera.resize_trigger();
    let coordinator = Coordinator::init(
        InitOptions::new(CoordinatorConfig::default())
            .graph(SimGraph::new(GraphData::with_nodes(5)))
            .layout(RecordingLayout::new(timeline.clone()))
            .camera(camera)
            .clock(clock),
    );
    let (handle, task) = spawn(coordinator, DEFAULT_CHANNEL_BUFFER);

    handle.set_graph_data(GraphData::with_nodes(9)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert!(resize.resize(ViewportChange {
        width: 1280,
        height: 720,
    }));
    tokio::time::sleep(Duration::from_millis(400)).await;

    let metrics = handle.metrics().await.unwrap();
    assert_eq!(metrics.camera_corrections, 1);
    assert_eq!(metrics.layout_corrections, 1);
    assert_eq!(layout_times(&timeline), vec![900]);

    handle.shutdown().await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), task).await;
    assert!(result.is_ok(), "Coordinator task should shut down gracefully");
}

#[tokio::test(start_paused = true)]
async fn test_handle_errors_after_shutdown() {
    let coordinator = Coordinator::init(InitOptions::new(CoordinatorConfig::default()).clock(TokioClock::new()));
    let (handle, task) = spawn(coordinator, DEFAULT_CHANNEL_BUFFER);

    handle.shutdown().await.unwrap();
    task.await.unwrap();

    assert!(handle.metrics().await.is_err());
    assert!(handle.coordinate(CoordinateOptions::default()).await.is_err());
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_loads_from_explicit_path() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(
        file,
        "log-level: debug\ncoordinator:\n  layout-cooldown-ms: 2000\n  auto-adjust-camera: false"
    )
    .unwrap();

    let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
    assert_eq!(config.log_level.as_deref(), Some("debug"));
    assert_eq!(config.coordinator.layout_cooldown_ms, 2000);
    assert!(!config.coordinator.auto_adjust_camera);
    assert_eq!(config.coordinator.camera_adjustment_delay_ms, 500);
}

#[test]
fn test_config_explicit_path_missing_is_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let missing = temp_dir.path().join("nope.yml");
    assert!(Config::load(Some(&missing)).is_err());
}

// =============================================================================
// CLI Tests
// =============================================================================

fn ns(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ns").expect("binary should build");
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"));
    cmd
}

#[test]
fn test_cli_config_prints_defaults() {
    let home = TempDir::new().expect("Failed to create temp dir");
    ns(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("layout-cooldown-ms: 1000"))
        .stdout(predicate::str::contains("camera-settle-window-ms: 300"));
}

#[test]
fn test_cli_simulate_json_report() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let scenario = home.path().join("jitter.yml");
    std::fs::write(
        &scenario,
        r#"
name: jitter
write-back: false
steps:
  - at-ms: 0
    action: { kind: move-camera, position: { x: 0, y: 0, z: 100 } }
  - at-ms: 50
    action: { kind: move-camera, position: { x: 0, y: 0, z: 110 } }
"#,
    )
    .unwrap();

    ns(&home)
        .args(["simulate", "--format", "json"])
        .arg(&scenario)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"call\": \"improve-separation\""))
        .stdout(predicate::str::contains("\"stale_aborts\": 1"));
}

#[test]
fn test_cli_simulate_text_report() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let scenario = home.path().join("cycle.yml");
    std::fs::write(&scenario, "name: cycle\nsteps:\n  - at-ms: 0\n    action: { kind: coordinate }\n").unwrap();

    ns(&home)
        .arg("simulate")
        .arg(&scenario)
        .assert()
        .success()
        .stdout(predicate::str::contains("Scenario:"))
        .stdout(predicate::str::contains("fit-all-nodes duration=800ms"));
}

#[test]
fn test_cli_simulate_missing_scenario_fails() {
    let home = TempDir::new().expect("Failed to create temp dir");
    ns(&home)
        .args(["simulate", "missing.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read scenario"));
}
