//! Core domain types: task names, task definitions and the local clock.

pub mod clock;
pub mod task;
pub mod types;
