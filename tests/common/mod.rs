//! Common test utilities shared across integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use taskmon::core::clock::{LocalClock, parse_timezone};
use taskmon::startup::open_scheduler_with_clock;
use taskmon::testing::{ManualClock, RecordingHandler};
use taskmon::{AuditLog, EventBus, Interpreter, Scheduler, Settings, TaskSourceConfig};
use tempfile::TempDir;

/// A throwaway runner directory with its own log, registry and scripts.
///
/// Scripts are `sh` scripts so the tests do not depend on Python.
pub struct Workspace {
    pub dir: TempDir,
    pub clock: Arc<ManualClock>,
    pub settings: Settings,
}

impl Workspace {
    /// Empty workspace with the clock at 2024-05-01 09:00:00 Asia/Taipei.
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let settings = Settings {
            audit_log: dir.path().join("task_monitor.log"),
            registry: dir.path().join("tasks_config.json"),
            interpreter: Interpreter::new("sh"),
            ..Settings::default()
        };
        Self {
            dir,
            clock: Arc::new(ManualClock::at_local(2024, 5, 1, 9, 0, 0)),
            settings,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a script under the workspace and add it to the task list.
    pub fn task(&mut self, name: &str, rel: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, body).unwrap();
        self.task_at(name, path.clone());
        path
    }

    /// Add a task whose script may not exist.
    pub fn task_at(&mut self, name: &str, script: PathBuf) {
        self.settings.tasks.push(TaskSourceConfig {
            name: name.to_string(),
            script,
        });
    }

    /// Audit log handle on the workspace log, using the workspace clock.
    pub fn audit(&self) -> AuditLog {
        let clock = LocalClock::new(
            self.clock.clone(),
            parse_timezone(&self.settings.timezone).unwrap(),
        );
        AuditLog::new(&self.settings.audit_log, clock)
    }

    /// Overwrite the audit log with raw bytes.
    pub fn write_log(&self, bytes: &[u8]) {
        std::fs::write(&self.settings.audit_log, bytes).unwrap();
    }

    pub fn log_text(&self) -> String {
        std::fs::read_to_string(&self.settings.audit_log).unwrap_or_default()
    }

    /// Open a scheduler with every configured task registered.
    pub async fn scheduler(&self) -> (Scheduler, Arc<RecordingHandler>) {
        let recorder = RecordingHandler::new();
        let bus = Arc::new(EventBus::new());
        bus.register(recorder.clone()).await;

        let mut scheduler = open_scheduler_with_clock(&self.settings, self.clock.clone())
            .await
            .unwrap()
            .with_event_bus(bus);
        taskmon::register_tasks(scheduler.registry_mut(), &self.settings.tasks)
            .await
            .unwrap();
        (scheduler, recorder)
    }
}

/// Names as plain strings, for terse assertions.
pub fn names(tasks: &[taskmon::TaskName]) -> Vec<String> {
    tasks.iter().map(|t| t.to_string()).collect()
}
