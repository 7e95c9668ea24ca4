//! Reminder window and delivery tests.

use std::sync::Arc;

use chrono::Duration;
use serde_json::json;

use duebell::ingest::IngestResponse;

use crate::fixtures::{batch_of, due_in, fixed_now, reminder_parts, RecordingPublisher, TestService};

fn lead() -> Duration {
    Duration::minutes(60)
}

/// Test: Full reminder scenario
/// Given a task due 90 minutes from now
/// When the scanner runs at +31 minutes (inside [due-60, due))
/// Then exactly one reminder fires, the flag is persisted, and +32 is quiet
#[tokio::test]
async fn test_reminder_fires_once_inside_window() {
    let service = TestService::new().await;
    let now = fixed_now();
    let response = service
        .handler
        .handle_at(&batch_of("A", &due_in(now, 90)), now)
        .await;
    assert_eq!(response.status(), "success");
    let id = service.store.snapshot().await[0].id.clone();

    let publisher = Arc::new(RecordingPublisher::default());
    let scheduler = service.scheduler(publisher.clone());

    assert!(scheduler.tick(now + Duration::minutes(29)).await.is_empty());

    let fired = scheduler.tick(now + Duration::minutes(31)).await;
    assert_eq!(fired.len(), 1);
    assert_eq!(reminder_parts(&fired[0]), ("A", id.0.as_str()));
    assert!(service.persisted()[0].reminder_sent);

    assert!(scheduler.tick(now + Duration::minutes(32)).await.is_empty());
    assert_eq!(publisher.sent().len(), 1);
}

/// Test: Immediate double scan
/// Then the due task is returned once across both calls
#[tokio::test]
async fn test_double_scan_same_instant_returns_task_once() {
    let service = TestService::new().await;
    let now = fixed_now();
    service
        .handler
        .handle_at(&batch_of("twice?", &due_in(now, 20)), now)
        .await;

    let first = service.store.scan_due(now, lead()).await;
    let second = service.store.scan_due(now, lead()).await;
    assert_eq!(first.len() + second.len(), 1);
}

/// Test: Nothing fires before the window opens
#[tokio::test]
async fn test_no_reminder_before_window() {
    let service = TestService::new().await;
    let now = fixed_now();
    service
        .handler
        .handle_at(&batch_of("far", &due_in(now, 240)), now)
        .await;

    for minutes in [0, 60, 120, 179] {
        assert!(
            service
                .store
                .scan_due(now + Duration::minutes(minutes), lead())
                .await
                .is_empty(),
            "fired {minutes} minutes in, window opens at 180"
        );
    }
    assert!(!service.persisted()[0].reminder_sent);
}

/// Test: Nothing fires at or after the due time
/// Given a task whose whole window passed unscanned
/// Then it is silently skipped and stays unsent
#[tokio::test]
async fn test_missed_window_is_skipped() {
    let service = TestService::new().await;
    let now = fixed_now();
    service
        .handler
        .handle_at(&batch_of("missed", &due_in(now, 10)), now)
        .await;

    for minutes in [10, 11, 600] {
        assert!(service
            .store
            .scan_due(now + Duration::minutes(minutes), lead())
            .await
            .is_empty());
    }
    assert!(!service.store.snapshot().await[0].reminder_sent);
}

/// Test: Several tasks due in the same tick each fire once
#[tokio::test]
async fn test_multiple_due_tasks_in_one_tick() {
    let service = TestService::new().await;
    let now = fixed_now();
    let batch = json!([
        {"title": "one", "due": due_in(now, 5)},
        {"title": "two", "due": due_in(now, 50)},
        {"title": "later", "due": due_in(now, 500)}
    ]);
    assert!(matches!(
        service.handler.handle_at(&batch, now).await,
        IngestResponse::Success { added: 3, .. }
    ));

    let publisher = Arc::new(RecordingPublisher::default());
    let fired = service.scheduler(publisher.clone()).tick(now).await;

    let titles: Vec<_> = fired.iter().map(|n| reminder_parts(n).0).collect();
    assert_eq!(titles, vec!["one", "two"]);
    let flags: Vec<_> = service
        .persisted()
        .into_iter()
        .map(|t| t.reminder_sent)
        .collect();
    assert_eq!(flags, vec![true, true, false]);
}

/// Test: A corrupt stored task does not stop the scan
#[tokio::test]
async fn test_corrupt_stored_due_does_not_stop_scan() {
    let service = TestService::new().await;
    let now = fixed_now();
    std::fs::write(
        &service.task_file,
        json!([
            {"id": "deadbeef", "title": "broken", "due": "whenever", "reminder_sent": false},
            {"id": "cafebabe", "title": "fine", "due": due_in(now, 15), "reminder_sent": false}
        ])
        .to_string(),
    )
    .unwrap();
    let service = service.restart().await;

    let fired = service.store.scan_due(now, lead()).await;
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].title, "fine");
}
