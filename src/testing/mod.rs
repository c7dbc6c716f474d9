//! Testing utilities for users of the taskmon library.
//!
//! - [`ManualClock`]: a settable clock for pinning "today"
//! - [`RecordingHandler`]: an event handler that keeps every event it sees

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

use crate::core::clock::Clock;
use crate::core::types::TaskName;
use crate::events::{Event, EventHandler};

/// A clock that only moves when told to.
///
/// # Example
///
/// ```
/// use taskmon::testing::ManualClock;
/// use taskmon::core::clock::Clock;
///
/// let clock = ManualClock::at_local(2024, 5, 1, 9, 0, 0);
/// clock.advance(chrono::Duration::days(1));
/// assert_eq!(clock.now().to_rfc3339(), "2024-05-02T01:00:00+00:00");
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Start at the given UTC instant.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Start at a wall-clock time in Asia/Taipei.
    ///
    /// # Panics
    ///
    /// Panics if the date and time are not a valid local time.
    pub fn at_local(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Self::new(taipei_to_utc(year, month, day, hour, min, sec))
    }

    /// Jump to a wall-clock time in Asia/Taipei.
    ///
    /// # Panics
    ///
    /// Panics if the date and time are not a valid local time.
    pub fn set_local(&self, year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) {
        self.set(taipei_to_utc(year, month, day, hour, min, sec));
    }

    /// Jump to a UTC instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(|e| e.into_inner()) = now;
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

fn taipei_to_utc(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    chrono_tz::Asia::Taipei
        .with_ymd_and_hms(year, month, day, hour, min, sec)
        .single()
        .expect("valid Asia/Taipei local time")
        .with_timezone(&Utc)
}

/// Event handler that records every event it receives.
#[derive(Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<Event>>,
}

impl RecordingHandler {
    /// Create a handler ready to be registered on an event bus.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All events received so far.
    pub async fn events(&self) -> Vec<Event> {
        self.events.lock().await.clone()
    }

    /// Names of tasks that emitted `TaskStarted`, in order.
    pub async fn started(&self) -> Vec<TaskName> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                Event::TaskStarted { task, .. } => Some(task.clone()),
                _ => None,
            })
            .collect()
    }

    /// Names of tasks that emitted `TaskSkipped`, in order.
    pub async fn skipped(&self) -> Vec<TaskName> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                Event::TaskSkipped { task, .. } => Some(task.clone()),
                _ => None,
            })
            .collect()
    }

    /// Forget everything recorded so far.
    pub async fn clear(&self) {
        self.events.lock().await.clear();
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(&self, event: &Event) {
        self.events.lock().await.push(event.clone());
    }
}
