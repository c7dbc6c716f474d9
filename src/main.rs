//! taskmon - run each task once per day.
//!
//! Usage:
//!   taskmon run              Register configured tasks and loop forever
//!   taskmon once             Register configured tasks and run a single cycle
//!   taskmon status           Show each registered task's last success and due state
//!   taskmon trigger <NAME>   Run one task now, regardless of due state
//!   taskmon validate         Load and check the settings file

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taskmon::core::clock::format_timestamp;
use taskmon::{
    Event, EventBus, EventHandler, ExecutionError, Scheduler, Settings, TaskName, YamlLoader,
    open_scheduler, register_tasks, resolve_config_path,
};
use tracing::{error, info, warn};

/// taskmon - a daily periodic task runner
#[derive(Parser)]
#[command(name = "taskmon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (default: taskmon.local.yaml, then taskmon.yaml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register configured tasks and check them every interval
    Run,

    /// Register configured tasks and run a single cycle
    Once,

    /// Show registered tasks with their last success date
    Status,

    /// Run a task now (one-shot execution)
    Trigger {
        /// Task name to run
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Validate the settings file without running
    Validate,
}

/// Prints one line per task decision and logs script output.
struct ConsoleHandler;

#[async_trait::async_trait]
impl EventHandler for ConsoleHandler {
    async fn handle(&self, event: &Event) {
        match event {
            Event::TaskStarted { task, timestamp } => {
                println!("[{}] 執行任務: {}", format_timestamp(timestamp), task);
            }
            Event::TaskSkipped {
                task, timestamp, ..
            } => {
                println!("[{}] 任務 {} 今天已執行過", format_timestamp(timestamp), task);
            }
            Event::TaskCompleted {
                task,
                stdout,
                stderr,
                exit_code,
                duration,
                ..
            } => {
                let exit_info = exit_code
                    .map(|c| format!(" (exit: {})", c))
                    .unwrap_or_default();
                info!("Task '{}' completed in {:?}{}", task, duration, exit_info);
                if let Some(out) = stdout {
                    for line in out.trim().lines() {
                        info!("    stdout: {}", line);
                    }
                }
                if let Some(err) = stderr {
                    for line in err.trim().lines() {
                        warn!("    stderr: {}", line);
                    }
                }
            }
            Event::TaskFailed { task, error, .. } => {
                error!("Task '{}' failed: {}", task, error);
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Run => run_scheduler(&settings).await?,
        Commands::Once => run_once(&settings).await?,
        Commands::Status => show_status(&settings).await?,
        Commands::Trigger { name } => trigger_task(&settings, TaskName::new(name)).await?,
        Commands::Validate => validate(&settings),
    }

    Ok(())
}

fn load_settings(explicit: Option<&Path>) -> Result<Settings, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let path = resolve_config_path(explicit, &cwd)?;
    info!("Loading settings from: {}", path.display());
    match YamlLoader::load_settings(&path) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            error!("Invalid settings: {}", e);
            Err(e.into())
        }
    }
}

/// Open the scheduler with console output and the configured tasks registered.
async fn prepare(settings: &Settings) -> Result<Scheduler, Box<dyn std::error::Error>> {
    let event_bus = Arc::new(EventBus::new());
    event_bus.register(Arc::new(ConsoleHandler)).await;

    let mut scheduler = open_scheduler(settings).await?.with_event_bus(event_bus);
    register_tasks(scheduler.registry_mut(), &settings.tasks).await?;
    Ok(scheduler)
}

/// Loop forever until Ctrl+C.
async fn run_scheduler(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let mut scheduler = prepare(settings).await?;

    if settings.tasks.is_empty() {
        warn!("No tasks configured");
    }

    info!(
        "Starting scheduler (interval: {}s)...",
        settings.interval_secs
    );
    info!("Press Ctrl+C to stop");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
        }
        _ = scheduler.run() => {}
    }

    Ok(())
}

async fn run_once(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let mut scheduler = prepare(settings).await?;
    let report = scheduler.run_cycle().await;

    info!(
        "Cycle {}: {} ran, {} skipped, {} failed",
        report.cycle_id,
        report.ran.len(),
        report.skipped.len(),
        report.failed.len()
    );
    if !report.failed.is_empty() {
        let failed: Vec<&str> = report.failed.iter().map(|t| t.as_str()).collect();
        return Err(format!("failed tasks: {}", failed.join(", ")).into());
    }
    Ok(())
}

async fn show_status(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let scheduler = open_scheduler(settings).await?;
    let status = scheduler.status();

    if status.is_empty() {
        println!("No tasks registered in {}", settings.registry.display());
        return Ok(());
    }

    println!("Tasks in {}:", settings.registry.display());
    println!();

    for task in &status {
        println!("Name: {}", task.name);
        println!("  Script: {}", task.definition.script_path.display());
        println!(
            "  Last run (registry): {}",
            task.definition.last_run.as_deref().unwrap_or("never")
        );
        println!(
            "  Last success (log): {}",
            task.last_success
                .map(|d| d.to_string())
                .unwrap_or_else(|| "never".to_string())
        );
        println!("  Due: {}", if task.due { "yes" } else { "no" });
        println!();
    }

    Ok(())
}

async fn trigger_task(
    settings: &Settings,
    name: TaskName,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut scheduler = prepare(settings).await?;

    // Unknown names still go through the executor so the audit log records them.
    info!("Triggering task '{}'...", name);
    match scheduler.trigger(&name).await {
        Ok(outcome) => {
            info!("Task '{}' finished in {:?}", name, outcome.duration);
            Ok(())
        }
        Err(e @ ExecutionError::UnknownTask(_)) => {
            error!(
                "Available tasks: {}",
                scheduler
                    .registry()
                    .names()
                    .iter()
                    .map(|n| n.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn validate(settings: &Settings) {
    info!("Settings are valid:");
    info!("  Timezone: {}", settings.timezone);
    info!("  Interval: {}s", settings.interval_secs);
    info!("  Audit log: {}", settings.audit_log.display());
    info!("  Registry: {}", settings.registry.display());
    info!("  Interpreter: {}", settings.interpreter.program);
    info!("  {} task(s):", settings.tasks.len());
    for task in &settings.tasks {
        info!("    - {}: {}", task.name, task.script.display());
    }
}
