//! Lifecycle events and event handling.
//!
//! The scheduling loop emits an event for every decision it makes. The console
//! reporter in the binary and the integration tests subscribe to them.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::core::types::{CycleId, TaskName};

/// Lifecycle events emitted by the scheduler.
#[derive(Debug, Clone)]
pub enum Event {
    /// A cycle over all registered tasks has begun.
    CycleStarted {
        cycle_id: CycleId,
        task_count: usize,
        timestamp: DateTime<Tz>,
    },

    /// A task already succeeded today and was not run.
    TaskSkipped {
        task: TaskName,
        last_success: Option<NaiveDate>,
        timestamp: DateTime<Tz>,
    },

    /// A task is about to be executed.
    TaskStarted {
        task: TaskName,
        timestamp: DateTime<Tz>,
    },

    /// A task finished and its success was recorded.
    TaskCompleted {
        task: TaskName,
        duration: Duration,
        stdout: Option<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
        timestamp: DateTime<Tz>,
    },

    /// A task could not be executed or its outcome could not be recorded.
    TaskFailed {
        task: TaskName,
        error: String,
        timestamp: DateTime<Tz>,
    },

    /// A cycle finished.
    CycleCompleted {
        cycle_id: CycleId,
        ran: usize,
        skipped: usize,
        failed: usize,
        timestamp: DateTime<Tz>,
    },
}

impl Event {
    /// Local time at which the event was emitted.
    pub fn timestamp(&self) -> &DateTime<Tz> {
        match self {
            Event::CycleStarted { timestamp, .. } => timestamp,
            Event::TaskSkipped { timestamp, .. } => timestamp,
            Event::TaskStarted { timestamp, .. } => timestamp,
            Event::TaskCompleted { timestamp, .. } => timestamp,
            Event::TaskFailed { timestamp, .. } => timestamp,
            Event::CycleCompleted { timestamp, .. } => timestamp,
        }
    }

    /// The task this event concerns, if any.
    pub fn task(&self) -> Option<&TaskName> {
        match self {
            Event::TaskSkipped { task, .. }
            | Event::TaskStarted { task, .. }
            | Event::TaskCompleted { task, .. }
            | Event::TaskFailed { task, .. } => Some(task),
            Event::CycleStarted { .. } | Event::CycleCompleted { .. } => None,
        }
    }
}

/// Handler for receiving lifecycle events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an event.
    async fn handle(&self, event: &Event);
}

/// Event bus for distributing events to registered handlers.
pub struct EventBus {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventBus {
    /// Create a new event bus with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Register an event handler.
    pub async fn register(&self, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);
    }

    /// Emit an event to all registered handlers.
    pub async fn emit(&self, event: Event) {
        let handlers = self.handlers.read().await;
        for handler in handlers.iter() {
            handler.handle(&event).await;
        }
    }

    /// Get the number of registered handlers.
    pub async fn handler_count(&self) -> usize {
        self.handlers.read().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
