//! navshell - layout/camera coordination shell
//!
//! CLI entry point for replaying coordination scenarios and inspecting config.

use std::fs;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use navshell::cli::{Cli, Command, OutputFormat, get_log_path};
use navshell::config::Config;
use navshell::sim::{Call, Scenario, SimReport};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Simulate {
            scenario,
            realtime,
            format,
        } => {
            let scenario = Scenario::load(&scenario)?;
            let report = if realtime {
                scenario.run_live(&config.coordinator).await?
            } else {
                scenario.run(&config.coordinator)
            };
            print_report(&report, format)
        }
        Command::Config => {
            print!("{}", serde_yaml::to_string(&config).context("Failed to serialize config")?);
            Ok(())
        }
    }
}

fn print_report(report: &SimReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Text => {
            println!("{} {}", "Scenario:".bold(), report.name);
            for entry in &report.entries {
                let line = match &entry.call {
                    Call::ImproveSeparation {
                        maintain_hierarchy,
                        failed,
                        ..
                    } => {
                        let text = format!("improve-separation maintain-hierarchy={}", maintain_hierarchy);
                        if *failed { text.red() } else { text.green() }
                    }
                    Call::FitAllNodes {
                        duration_ms,
                        maintain_angle,
                        failed,
                        ..
                    } => {
                        let text = format!("fit-all-nodes duration={}ms maintain-angle={}", duration_ms, maintain_angle);
                        if *failed { text.red() } else { text.cyan() }
                    }
                    Call::ObserveViewport { graph_id } => format!("observe-viewport graph={}", graph_id).dimmed(),
                };
                println!("{:>8}ms  {}", entry.at_ms, line);
            }

            let m = &report.metrics;
            println!();
            println!("{}", "Metrics:".bold());
            println!("  layout corrections:     {}", m.layout_corrections);
            println!("  camera corrections:     {}", m.camera_corrections);
            println!("  stale aborts:           {}", m.stale_aborts);
            println!("  cooldown skips:         {}", m.cooldown_skips);
            println!("  suppressed mutations:   {}", m.suppressed_mutations);
            println!("  suppressed corrections: {}", m.suppressed_corrections);
            println!("  collaborator failures:  {}", m.collaborator_failures);
            println!("  cycles completed:       {}", m.cycles_completed);
            println!("  pending timers:         {}", m.pending_timers);
            println!("  timers fired:           {}/{}", m.timers_fired, m.timers_scheduled);
            println!("  ended at:               {}ms", report.ended_at_ms);
        }
    }
    Ok(())
}
