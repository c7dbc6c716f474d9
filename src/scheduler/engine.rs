//! Scheduler engine implementation.
//!
//! The scheduler is responsible for:
//! - Walking the registry in order once per cycle
//! - Running tasks that have not succeeded today
//! - Manual triggers that ignore the due state
//! - Event emission

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

use super::due::{DueDateResolver, due_after};
use crate::core::clock::LocalClock;
use crate::core::task::TaskDefinition;
use crate::core::types::{CycleId, TaskName};
use crate::events::{Event, EventBus};
use crate::execution::{ExecutionError, ExecutionOutcome, TaskExecutor};
use crate::registry::Registry;

/// Default pause between cycles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Result of one pass over the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle_id: CycleId,
    /// Tasks that ran and were recorded as successful.
    pub ran: Vec<TaskName>,
    /// Tasks that already succeeded today.
    pub skipped: Vec<TaskName>,
    /// Tasks whose run failed.
    pub failed: Vec<TaskName>,
}

impl CycleReport {
    fn new(cycle_id: CycleId) -> Self {
        Self {
            cycle_id,
            ran: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Number of tasks considered in the cycle.
    pub fn total(&self) -> usize {
        self.ran.len() + self.skipped.len() + self.failed.len()
    }
}

/// Due state of one registered task.
#[derive(Debug, Clone)]
pub struct TaskStatus {
    pub name: TaskName,
    pub definition: TaskDefinition,
    pub last_success: Option<NaiveDate>,
    pub due: bool,
}

/// The scheduling loop.
pub struct Scheduler {
    registry: Registry,
    resolver: DueDateResolver,
    executor: TaskExecutor,
    event_bus: Arc<EventBus>,
    interval: Duration,
    clock: LocalClock,
}

impl Scheduler {
    /// Create a scheduler over `registry`.
    ///
    /// Due dates are resolved from the executor's audit log.
    pub fn new(registry: Registry, executor: TaskExecutor) -> Self {
        let audit = executor.audit().clone();
        Self {
            registry,
            clock: audit.clock().clone(),
            resolver: DueDateResolver::new(audit),
            executor,
            event_bus: Arc::new(EventBus::new()),
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Set a shared event bus.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Set the pause between cycles.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Get the event bus.
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Get the pause between cycles.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Get the registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Get the registry for registration.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Run cycles forever, sleeping the interval between them.
    pub async fn run(&mut self) {
        tracing::info!(interval = ?self.interval, tasks = self.registry.table().len(), "Scheduler started");
        loop {
            self.run_cycle().await;
            tracing::debug!(interval = ?self.interval, "Sleeping until next cycle");
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Run one pass over the registry in storage order.
    ///
    /// A failing task is recorded in the report and the pass continues.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::new(CycleId::new());
        let names = self.registry.names();

        self.event_bus
            .emit(Event::CycleStarted {
                cycle_id: report.cycle_id,
                task_count: names.len(),
                timestamp: self.clock.now(),
            })
            .await;

        for task in names {
            // Scripts may run past midnight, so "today" is read per task.
            let last_success = self.resolver.last_success_date(&task);
            let due = due_after(last_success, self.clock.today());

            if !due {
                tracing::info!(task = %task, "Task already ran today");
                self.event_bus
                    .emit(Event::TaskSkipped {
                        task: task.clone(),
                        last_success,
                        timestamp: self.clock.now(),
                    })
                    .await;
                report.skipped.push(task);
                continue;
            }

            match self.execute(&task).await {
                Ok(_) => report.ran.push(task),
                Err(_) => report.failed.push(task),
            }
        }

        tracing::info!(
            cycle_id = %report.cycle_id,
            ran = report.ran.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Cycle completed"
        );
        self.event_bus
            .emit(Event::CycleCompleted {
                cycle_id: report.cycle_id,
                ran: report.ran.len(),
                skipped: report.skipped.len(),
                failed: report.failed.len(),
                timestamp: self.clock.now(),
            })
            .await;

        report
    }

    /// Run a task now regardless of its due state.
    pub async fn trigger(&mut self, task: &TaskName) -> Result<ExecutionOutcome, ExecutionError> {
        tracing::info!(task = %task, "Manual trigger");
        self.execute(task).await
    }

    /// Due state of every registered task, in registry order.
    pub fn status(&self) -> Vec<TaskStatus> {
        let today = self.clock.today();
        self.registry
            .table()
            .iter()
            .map(|(name, definition)| {
                let last_success = self.resolver.last_success_date(name);
                TaskStatus {
                    name: name.clone(),
                    definition: definition.clone(),
                    last_success,
                    due: due_after(last_success, today),
                }
            })
            .collect()
    }

    async fn execute(&mut self, task: &TaskName) -> Result<ExecutionOutcome, ExecutionError> {
        self.event_bus
            .emit(Event::TaskStarted {
                task: task.clone(),
                timestamp: self.clock.now(),
            })
            .await;

        let result = self.executor.run(&mut self.registry, task).await;

        match &result {
            Ok(outcome) => {
                self.event_bus
                    .emit(Event::TaskCompleted {
                        task: task.clone(),
                        duration: outcome.duration,
                        stdout: non_empty(&outcome.stdout),
                        stderr: non_empty(&outcome.stderr),
                        exit_code: outcome.exit_code,
                        timestamp: outcome.finished_at,
                    })
                    .await;
            }
            Err(e) => {
                self.event_bus
                    .emit(Event::TaskFailed {
                        task: task.clone(),
                        error: e.to_string(),
                        timestamp: self.clock.now(),
                    })
                    .await;
            }
        }

        result
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
