//! Execution integration tests.
//!
//! Tests that verify script invocation, directory scoping and the persisted
//! registry document.

use crate::common::Workspace;
use taskmon::{ExecutionError, TaskName};

#[tokio::test]
async fn test_script_runs_in_its_own_directory() {
    let mut ws = Workspace::new();
    ws.task("Where", "deep/nested/where.sh", "pwd > cwd.txt\n");
    let (mut scheduler, _recorder) = ws.scheduler().await;
    let before = std::env::current_dir().unwrap();

    scheduler.trigger(&TaskName::new("Where")).await.unwrap();

    assert_eq!(std::env::current_dir().unwrap(), before);
    let recorded = std::fs::read_to_string(ws.path().join("deep/nested/cwd.txt")).unwrap();
    assert_eq!(
        std::path::PathBuf::from(recorded.trim()).canonicalize().unwrap(),
        ws.path().join("deep/nested").canonicalize().unwrap()
    );
}

#[tokio::test]
async fn test_working_directory_unchanged_when_script_fails() {
    let mut ws = Workspace::new();
    ws.settings.exit_status = taskmon::ExitStatusPolicy::RequireSuccess;
    ws.task("Broken", "jobs/broken.sh", "exit 9\n");
    let (mut scheduler, _recorder) = ws.scheduler().await;
    let before = std::env::current_dir().unwrap();

    let err = scheduler.trigger(&TaskName::new("Broken")).await.unwrap_err();

    assert!(matches!(err, ExecutionError::ScriptFailed { code: Some(9), .. }));
    assert_eq!(std::env::current_dir().unwrap(), before);

    let lines: Vec<String> = ws.log_text().lines().map(str::to_string).collect();
    let n = lines.len();
    assert!(lines[n - 2].contains(" - 切換回原始目錄: "));
    assert!(lines[n - 1].contains(" - ERROR - 執行任務失敗 Broken: "));
}

#[tokio::test]
async fn test_audit_trail_of_a_successful_run() {
    let mut ws = Workspace::new();
    let script = ws.task("Backup", "jobs/backup.sh", "true\n");
    let (mut scheduler, _recorder) = ws.scheduler().await;

    scheduler.run_cycle().await;

    let cwd = std::env::current_dir().unwrap();
    let expected = format!(
        "2024-05-01 09:00:00 - 添加新任務: Backup\n\
         2024-05-01 09:00:00 - 切換到工作目錄: {}\n\
         2024-05-01 09:00:00 - 成功執行任務: Backup\n\
         2024-05-01 09:00:00 - 切換回原始目錄: {}\n",
        script.parent().unwrap().display(),
        cwd.display()
    );
    assert_eq!(ws.log_text(), expected);
}

#[tokio::test]
async fn test_registry_document_after_run() {
    let mut ws = Workspace::new();
    let script = ws.task("備份", "jobs/backup.sh", "true\n");
    let (mut scheduler, _recorder) = ws.scheduler().await;

    scheduler.run_cycle().await;

    let document = std::fs::read_to_string(&ws.settings.registry).unwrap();
    let expected = format!(
        "{{\n    \"備份\": {{\n        \"script_path\": \"{}\",\n        \"last_run\": \"2024-05-01 09:00:00\"\n    }}\n}}",
        script.display()
    );
    assert_eq!(document, expected);
}

#[tokio::test]
async fn test_missing_registry_is_created_empty() {
    let ws = Workspace::new();
    assert!(!ws.settings.registry.exists());

    let (scheduler, _recorder) = ws.scheduler().await;

    assert!(scheduler.registry().table().is_empty());
    assert_eq!(std::fs::read_to_string(&ws.settings.registry).unwrap(), "{}");
}

#[tokio::test]
async fn test_trigger_unknown_task_logs_and_fails() {
    let ws = Workspace::new();
    let (mut scheduler, _recorder) = ws.scheduler().await;

    let err = scheduler.trigger(&TaskName::new("Nobody")).await.unwrap_err();

    assert!(matches!(err, ExecutionError::UnknownTask(_)));
    assert_eq!(
        ws.log_text(),
        "2024-05-01 09:00:00 - ERROR - 任務不存在: Nobody\n"
    );
}
