//! Durability across restarts.

use std::sync::Arc;

use chrono::Duration;
use serde_json::json;

use crate::fixtures::{batch_of, due_in, fixed_now, RecordingPublisher, TestService};

/// Test: Tasks survive a restart
#[tokio::test]
async fn test_tasks_reload_after_restart() {
    let service = TestService::new().await;
    let now = fixed_now();
    service
        .handler
        .handle_at(&batch_of("persist me", &due_in(now, 120)), now)
        .await;
    let before = service.store.snapshot().await;

    let service = service.restart().await;

    assert_eq!(service.store.snapshot().await, before);
}

/// Test: A delivered reminder is not re-sent after a restart
#[tokio::test]
async fn test_delivered_flag_survives_restart() {
    let service = TestService::new().await;
    let now = fixed_now();
    service
        .handler
        .handle_at(&batch_of("only once", &due_in(now, 30)), now)
        .await;
    let publisher = Arc::new(RecordingPublisher::default());
    assert_eq!(service.scheduler(publisher.clone()).tick(now).await.len(), 1);

    let service = service.restart().await;
    let again = service
        .scheduler(publisher.clone())
        .tick(now + Duration::minutes(1))
        .await;

    assert!(again.is_empty());
    assert_eq!(publisher.sent().len(), 1);
}

/// Test: A missing task file starts an empty store, and the first ingest
/// creates it
#[tokio::test]
async fn test_missing_file_starts_empty() {
    let service = TestService::new().await;
    assert!(!service.task_file.exists());
    assert!(service.store.is_empty().await);

    let now = fixed_now();
    service
        .handler
        .handle_at(&batch_of("first", &due_in(now, 90)), now)
        .await;
    assert!(service.task_file.exists());
}

/// Test: An unreadable task file starts an empty store
#[tokio::test]
async fn test_unreadable_file_starts_empty() {
    let service = TestService::new().await;
    std::fs::write(&service.task_file, "this is not json").unwrap();

    let service = service.restart().await;

    assert!(service.store.is_empty().await);
}

/// Test: Files written with camelCase flags load as delivered
#[tokio::test]
async fn test_camel_case_flag_is_honoured() {
    let service = TestService::new().await;
    let now = fixed_now();
    std::fs::write(
        &service.task_file,
        json!([{"id": "0a1b2c3d", "title": "legacy", "due": due_in(now, 10), "reminderSent": true}])
            .to_string(),
    )
    .unwrap();

    let service = service.restart().await;

    assert!(service
        .store
        .scan_due(now, Duration::minutes(60))
        .await
        .is_empty());
    assert!(service.persisted()[0].reminder_sent);
}

/// Test: One malformed stored record is skipped, the others load, and the
/// next ingest keeps them on disk
#[tokio::test]
async fn test_malformed_record_does_not_cost_the_rest() {
    let service = TestService::new().await;
    let now = fixed_now();
    std::fs::write(
        &service.task_file,
        json!([
            {"id": "good0001", "title": "keep me", "due": due_in(now, 30)},
            {"id": "bad00002", "title": "bad", "due": 12345}
        ])
        .to_string(),
    )
    .unwrap();

    let service = service.restart().await;
    assert_eq!(service.store.len().await, 1);

    service
        .handler
        .handle_at(&batch_of("new", &due_in(now, 90)), now)
        .await;

    let titles: Vec<String> = service
        .persisted()
        .into_iter()
        .map(|task| task.title)
        .collect();
    assert_eq!(titles, vec!["keep me".to_string(), "new".to_string()]);
}
