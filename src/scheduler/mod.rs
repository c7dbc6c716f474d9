//! Scheduling loop.
//!
//! This module provides the loop that runs each registered task once per
//! calendar day and the resolver that decides whether a task is due.

mod due;
mod engine;

pub use due::{DueDateResolver, due_after};
pub use engine::{CycleReport, DEFAULT_INTERVAL, Scheduler, TaskStatus};
