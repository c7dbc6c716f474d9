//! Wiring from settings to a ready scheduler.

use std::sync::Arc;
use thiserror::Error;

use crate::audit::AuditLog;
use crate::config::{ConfigError, Settings, TaskSourceConfig};
use crate::core::clock::{Clock, LocalClock, SystemClock};
use crate::core::types::TaskName;
use crate::execution::TaskExecutor;
use crate::registry::{JsonFileRegistry, Registry, RegistryError};
use crate::scheduler::Scheduler;

/// Errors that prevent the runner from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Build a scheduler from settings using the system clock.
///
/// The registry is opened (and created if missing) but no task from the
/// settings is registered; see [`register_tasks`].
pub async fn open_scheduler(settings: &Settings) -> Result<Scheduler, StartupError> {
    open_scheduler_with_clock(settings, Arc::new(SystemClock)).await
}

/// Build a scheduler from settings with an explicit clock source.
pub async fn open_scheduler_with_clock(
    settings: &Settings,
    clock: Arc<dyn Clock>,
) -> Result<Scheduler, StartupError> {
    let clock = LocalClock::new(clock, settings.tz()?);
    let audit = AuditLog::new(&settings.audit_log, clock);

    let store = Arc::new(JsonFileRegistry::new(&settings.registry));
    let registry = Registry::open(store).await?.with_audit(audit.clone());

    let executor = TaskExecutor::new(audit)
        .with_interpreter(settings.interpreter.clone())
        .with_exit_policy(settings.exit_status);

    Ok(Scheduler::new(registry, executor).with_interval(settings.interval()))
}

/// Register every configured task, in order.
///
/// Registration overwrites the script path and clears `last_run`. Due state is
/// unaffected since it comes from the audit log.
pub async fn register_tasks(
    registry: &mut Registry,
    tasks: &[TaskSourceConfig],
) -> Result<(), RegistryError> {
    for task in tasks {
        registry
            .upsert(TaskName::new(task.name.as_str()), task.script.clone())
            .await?;
    }
    Ok(())
}
