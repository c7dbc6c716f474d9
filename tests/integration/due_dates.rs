//! Due-date integration tests.
//!
//! Tests that check due decisions against hand-written audit logs.

use crate::common::{Workspace, names};
use taskmon::{DueDateResolver, TaskName};

/// "成功執行任務: Backup" in Big5.
const BIG5_SUCCESS_BACKUP: &[u8] = &[
    0xa6, 0xa8, 0xa5, 0x5c, 0xb0, 0xf5, 0xa6, 0xe6, 0xa5, 0xf4, 0xb0, 0xc8, b':', b' ', b'B', b'a',
    b'c', b'k', b'u', b'p',
];

/// "成功執行任務: Backup" in GBK.
const GBK_SUCCESS_BACKUP: &[u8] = &[
    0xb3, 0xc9, 0xb9, 0xa6, 0x88, 0xcc, 0xd0, 0xd0, 0xc8, 0xce, 0x84, 0xd5, b':', b' ', b'B', b'a',
    b'c', b'k', b'u', b'p',
];

fn log_line(timestamp: &str, message: &[u8]) -> Vec<u8> {
    let mut line = format!("{} - ", timestamp).into_bytes();
    line.extend_from_slice(message);
    line.push(b'\n');
    line
}

fn resolver(ws: &Workspace) -> DueDateResolver {
    DueDateResolver::new(ws.audit())
}

#[tokio::test]
async fn test_scenarios_a_b_c() {
    let ws = Workspace::new();
    let backup = TaskName::new("Backup");

    // A: no log at all.
    assert!(resolver(&ws).is_due(&backup));

    // B: success earlier the same day.
    ws.write_log("2024-05-01 09:00:00 - 成功執行任務: Backup\n".as_bytes());
    assert!(!resolver(&ws).is_due(&backup));

    // C: the next day.
    ws.clock.set_local(2024, 5, 2, 0, 0, 0);
    assert!(resolver(&ws).is_due(&backup));
}

#[tokio::test]
async fn test_legacy_encodings_read_like_utf8() {
    let backup = TaskName::new("Backup");
    let messages: [&[u8]; 3] = [
        "成功執行任務: Backup".as_bytes(),
        BIG5_SUCCESS_BACKUP,
        GBK_SUCCESS_BACKUP,
    ];

    for message in messages {
        let bytes = log_line("2024-05-01 08:00:00", message);
        let ws = Workspace::new();
        ws.write_log(&bytes);

        assert_eq!(
            resolver(&ws).last_success_date(&backup),
            chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
        );
    }
}

#[tokio::test]
async fn test_gbk_log_skips_task_in_cycle() {
    let mut ws = Workspace::new();
    ws.task("Backup", "jobs/backup.sh", "echo ran > ran.txt\n");
    let (mut scheduler, _recorder) = ws.scheduler().await;
    // Replaces the UTF-8 registration records, so the whole file is GBK.
    ws.write_log(&log_line("2024-05-01 07:30:00", GBK_SUCCESS_BACKUP));

    let report = scheduler.run_cycle().await;

    assert_eq!(names(&report.skipped), ["Backup"]);
    assert!(!ws.path().join("jobs/ran.txt").exists());
}

#[tokio::test]
async fn test_latest_record_wins_among_interleaved_tasks() {
    let ws = Workspace::new();
    ws.clock.set_local(2024, 5, 10, 12, 0, 0);
    ws.write_log(
        "2024-05-01 09:00:00 - 成功執行任務: Backup\n\
         2024-05-02 09:00:00 - 成功執行任務: Report\n\
         2024-05-03 09:00:00 - 成功執行任務: Backup\n\
         2024-05-04 09:00:00 - ERROR - 執行任務失敗 Backup: boom\n\
         2024-05-05 09:00:00 - 成功執行任務: Backup2\n\
         2024-05-06 09:00:00 - 成功執行任務: Report\n"
            .as_bytes(),
    );

    let resolver = resolver(&ws);
    assert_eq!(
        resolver.last_success_date(&TaskName::new("Backup")),
        chrono::NaiveDate::from_ymd_opt(2024, 5, 3)
    );
    assert_eq!(
        resolver.last_success_date(&TaskName::new("Report")),
        chrono::NaiveDate::from_ymd_opt(2024, 5, 6)
    );
}

#[tokio::test]
async fn test_unparsable_record_is_reported_and_skipped() {
    let ws = Workspace::new();
    ws.write_log(
        "2024-04-28 09:00:00 - 成功執行任務: Backup\n\
         yesterday-ish - 成功執行任務: Backup\n"
            .as_bytes(),
    );

    assert_eq!(
        resolver(&ws).last_success_date(&TaskName::new("Backup")),
        chrono::NaiveDate::from_ymd_opt(2024, 4, 28)
    );
    assert!(ws.log_text().contains(" - ERROR - 解析日期時出錯: "));
}

#[tokio::test]
async fn test_undecodable_log_means_never_run() {
    let ws = Workspace::new();
    // Invalid in UTF-8, Big5 and GBK alike.
    ws.write_log(&[0xff, 0xff, 0xff, b'\n']);

    assert!(resolver(&ws).is_due(&TaskName::new("Backup")));
}
