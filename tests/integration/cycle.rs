//! Scheduling cycle integration tests.
//!
//! Tests that drive full cycles against a real log, registry and scripts.

use crate::common::{Workspace, names};
use taskmon::{Event, ExitStatusPolicy, TaskName};

#[tokio::test]
async fn test_first_cycle_runs_everything_then_same_day_is_idempotent() {
    let mut ws = Workspace::new();
    ws.task("Backup", "jobs/backup.sh", "echo run >> runs.txt\n");
    ws.task("Report", "reports/report.sh", "echo run >> runs.txt\n");
    let (mut scheduler, recorder) = ws.scheduler().await;

    let first = scheduler.run_cycle().await;
    assert_eq!(names(&first.ran), ["Backup", "Report"]);

    let successes_before = ws.log_text().matches("成功執行任務").count();
    recorder.clear().await;
    ws.clock.advance(chrono::Duration::minutes(30));

    let second = scheduler.run_cycle().await;

    assert!(second.ran.is_empty());
    assert_eq!(names(&second.skipped), ["Backup", "Report"]);
    assert!(recorder.started().await.is_empty());
    assert_eq!(ws.log_text().matches("成功執行任務").count(), successes_before);

    // Each script ran exactly once.
    let runs = std::fs::read_to_string(ws.path().join("jobs/runs.txt")).unwrap();
    assert_eq!(runs.lines().count(), 1);
}

#[tokio::test]
async fn test_next_day_runs_again() {
    let mut ws = Workspace::new();
    ws.task("Backup", "jobs/backup.sh", "true\n");
    let (mut scheduler, _recorder) = ws.scheduler().await;

    scheduler.run_cycle().await;
    ws.clock.set_local(2024, 5, 1, 23, 59, 59);
    assert!(scheduler.run_cycle().await.ran.is_empty());

    ws.clock.set_local(2024, 5, 2, 0, 0, 0);
    assert_eq!(names(&scheduler.run_cycle().await.ran), ["Backup"]);
}

#[tokio::test]
async fn test_failing_task_does_not_block_others() {
    let mut ws = Workspace::new();
    ws.task("First", "a/first.sh", "true\n");
    let missing = ws.path().join("nowhere/ghost.sh");
    ws.task_at("Ghost", missing);
    ws.task("Last", "b/last.sh", "true\n");
    let (mut scheduler, recorder) = ws.scheduler().await;

    let report = scheduler.run_cycle().await;

    assert_eq!(names(&report.ran), ["First", "Last"]);
    assert_eq!(names(&report.failed), ["Ghost"]);
    assert_eq!(
        names(&recorder.started().await),
        ["First", "Ghost", "Last"]
    );

    let log = ws.log_text();
    assert!(log.contains(" - ERROR - 執行任務失敗 Ghost: "));
    assert!(!log.contains("成功執行任務: Ghost"));
    assert!(scheduler.registry().get(&TaskName::new("Ghost")).unwrap().last_run.is_none());
}

#[tokio::test]
async fn test_require_success_policy_marks_nonzero_exit_failed() {
    let mut ws = Workspace::new();
    ws.settings.exit_status = ExitStatusPolicy::RequireSuccess;
    ws.task("Flaky", "jobs/flaky.sh", "exit 2\n");
    let (mut scheduler, recorder) = ws.scheduler().await;

    let report = scheduler.run_cycle().await;

    assert_eq!(names(&report.failed), ["Flaky"]);
    let log = ws.log_text();
    assert!(log.contains(" - ERROR - 執行任務失敗 Flaky: script exited with code 2"));
    assert!(!log.contains("成功執行任務: Flaky"));

    // Still due, so the next cycle tries again.
    let again = scheduler.run_cycle().await;
    assert_eq!(names(&again.failed), ["Flaky"]);

    let failures = recorder
        .events()
        .await
        .iter()
        .filter(|e| matches!(e, Event::TaskFailed { .. }))
        .count();
    assert_eq!(failures, 2);
}

#[tokio::test]
async fn test_ignore_policy_records_nonzero_exit_as_run() {
    let mut ws = Workspace::new();
    ws.task("Flaky", "jobs/flaky.sh", "exit 2\n");
    let (mut scheduler, _recorder) = ws.scheduler().await;

    let report = scheduler.run_cycle().await;

    assert_eq!(names(&report.ran), ["Flaky"]);
    assert!(ws.log_text().contains("成功執行任務: Flaky"));
}

#[tokio::test]
async fn test_reregistration_keeps_due_state_from_log() {
    let mut ws = Workspace::new();
    ws.task("Backup", "jobs/backup.sh", "true\n");
    {
        let (mut scheduler, _recorder) = ws.scheduler().await;
        scheduler.run_cycle().await;
    }

    // A restart re-registers tasks, clearing last_run in the registry.
    let (mut scheduler, _recorder) = ws.scheduler().await;
    assert!(scheduler.registry().get(&TaskName::new("Backup")).unwrap().last_run.is_none());

    let report = scheduler.run_cycle().await;
    assert_eq!(names(&report.skipped), ["Backup"]);
}

#[tokio::test]
async fn test_cycle_events_are_ordered() {
    let mut ws = Workspace::new();
    ws.task("Backup", "jobs/backup.sh", "echo hello\n");
    let (mut scheduler, recorder) = ws.scheduler().await;

    scheduler.run_cycle().await;

    let events = recorder.events().await;
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], Event::CycleStarted { task_count: 1, .. }));
    assert!(matches!(events[1], Event::TaskStarted { .. }));
    match &events[2] {
        Event::TaskCompleted {
            task,
            stdout,
            exit_code,
            ..
        } => {
            assert_eq!(task.as_str(), "Backup");
            assert_eq!(stdout.as_deref().map(str::trim), Some("hello"));
            assert_eq!(*exit_code, Some(0));
        }
        other => panic!("Expected TaskCompleted, got {:?}", other),
    }
    assert!(matches!(
        events[3],
        Event::CycleCompleted {
            ran: 1,
            skipped: 0,
            failed: 0,
            ..
        }
    ));
}

#[tokio::test]
async fn test_name_with_trailing_space_runs_once_per_day() {
    let mut ws = Workspace::new();
    ws.task("Backup ", "jobs/backup.sh", "echo run >> runs.txt\n");
    let (mut scheduler, _recorder) = ws.scheduler().await;

    scheduler.run_cycle().await;
    ws.clock.advance(chrono::Duration::minutes(30));
    let second = scheduler.run_cycle().await;

    assert_eq!(names(&second.skipped), ["Backup "]);
    let runs = std::fs::read_to_string(ws.path().join("jobs/runs.txt")).unwrap();
    assert_eq!(runs.lines().count(), 1);
}
