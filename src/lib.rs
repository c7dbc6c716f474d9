//! taskmon - a daily periodic task runner.
//!
//! Each registered task runs an external script at most once per calendar day
//! in a fixed time zone. Whether a task already ran today is decided from the
//! audit log alone; the JSON registry is an advisory cache.

pub mod audit;
pub mod config;
pub mod core;
pub mod events;
pub mod execution;
pub mod registry;
pub mod scheduler;
pub mod startup;
pub mod testing;

pub use audit::{AuditError, AuditLevel, AuditLog, AuditRecord, DecodeError};
pub use config::{ConfigError, Settings, TaskSourceConfig, YamlLoader, resolve_config_path};
pub use crate::core::clock::{Clock, LocalClock, SystemClock, TimestampError};
pub use crate::core::task::TaskDefinition;
pub use crate::core::types::{CycleId, TaskName};
pub use events::{Event, EventBus, EventHandler};
pub use execution::{
    ExecutionError, ExecutionOutcome, ExitStatusPolicy, Interpreter, ScriptCommand, ScriptOutput,
    TaskExecutor,
};
pub use registry::{
    InMemoryRegistry, JsonFileRegistry, Registry, RegistryError, RegistryStore, TaskTable,
};
pub use scheduler::{CycleReport, DueDateResolver, Scheduler, TaskStatus};
pub use startup::{StartupError, open_scheduler, register_tasks};
