//! Ingest request handling tests.

use std::sync::Arc;

use serde_json::json;

use duebell::domain::validate::{ERR_DUE_FORMAT, ERR_DUE_PAST, ERR_TITLE};
use duebell::ingest::IngestResponse;

use crate::fixtures::{batch_of, due_in, fixed_now, TestService};

/// Test: A valid single-task batch
/// Given an empty store
/// When one task due in 90 minutes is ingested
/// Then the reply is success with added 1, total 1
#[tokio::test]
async fn test_single_valid_task_is_success() {
    let service = TestService::new().await;
    let now = fixed_now();

    let response = service
        .handler
        .handle_at(&batch_of("A", &due_in(now, 90)), now)
        .await;

    assert_eq!(
        response,
        IngestResponse::Success {
            added: 1,
            rejected: vec![],
            total: 1
        }
    );
    let persisted = service.persisted();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].title, "A");
    assert!(!persisted[0].reminder_sent);
}

/// Test: Empty title with a past due date
/// Then both errors are reported, in order, with the raw input echoed
#[tokio::test]
async fn test_empty_title_and_past_due_is_partial_success() {
    let service = TestService::new().await;
    let now = fixed_now();
    let past = "2025-08-01T23:15:00Z";

    let response = service.handler.handle_at(&batch_of("", past), now).await;

    let expected = json!({
        "status": "partial_success",
        "added": 0,
        "rejected": [{
            "title": "",
            "due": past,
            "errors": [ERR_TITLE, ERR_DUE_PAST]
        }],
        "total": 0
    });
    assert_eq!(serde_json::to_value(&response).unwrap(), expected);
    assert!(service.store.is_empty().await);
}

/// Test: A single object instead of a list
/// Then the reply is an error and the collection is untouched
#[tokio::test]
async fn test_non_list_request_leaves_store_unchanged() {
    let service = TestService::new().await;
    let now = fixed_now();
    service
        .handler
        .handle_at(&batch_of("existing", &due_in(now, 300)), now)
        .await;
    let before = service.store.len().await;

    let response = service
        .handler
        .handle_raw(&json!({"title": "lonely", "due": due_in(now, 90)}).to_string())
        .await;

    match response {
        IngestResponse::Error { message } => assert!(!message.is_empty()),
        other => panic!("expected error, got {:?}", other),
    }
    assert_eq!(service.store.len().await, before);
    assert_eq!(service.persisted().len(), before);
}

/// Test: Mixed batch keeps accepted candidates and reports the rest
#[tokio::test]
async fn test_mixed_batch_accepts_valid_items() {
    let service = TestService::new().await;
    let now = fixed_now();

    let batch = json!([
        {"title": "Pay rent", "due": due_in(now, 120)},
        {"title": "Bad date", "due": "the day after tomorrow"},
        {"title": "  ", "due": due_in(now, 30)},
        {"title": "Gym", "due": due_in(now, 45)},
        "not an object"
    ]);
    let response = service.handler.handle_at(&batch, now).await;

    match response {
        IngestResponse::PartialSuccess {
            added,
            rejected,
            total,
        } => {
            assert_eq!(added, 2);
            assert_eq!(total, 2);
            assert_eq!(rejected.len(), 3);
            assert_eq!(rejected[0].errors, vec![ERR_DUE_FORMAT]);
            assert_eq!(rejected[1].errors, vec![ERR_TITLE]);
            assert_eq!(rejected[2].errors.len(), 2);
        }
        other => panic!("expected partial_success, got {:?}", other),
    }

    let titles: Vec<_> = service
        .store
        .snapshot()
        .await
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["Pay rent", "Gym"]);
}

/// Test: Accepted dues are stored in canonical form
#[tokio::test]
async fn test_accepted_due_is_canonicalized() {
    let service = TestService::new().await;
    let now = fixed_now();

    service
        .handler
        .handle_at(&batch_of("Offset", "2026-10-16T16:00:00+02:00"), now)
        .await;

    assert_eq!(service.persisted()[0].due, "2026-10-16T14:00:00Z");
}

/// Test: Concurrent ingests never lose a task
/// Given two batches handled at the same time
/// Then the total equals the sum of accepted counts
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ingest_loses_nothing() {
    let service = Arc::new(TestService::new().await);
    let now = fixed_now();

    let batch = |prefix: &str, n: usize| {
        serde_json::Value::Array(
            (0..n)
                .map(|i| json!({"title": format!("{prefix}-{i}"), "due": due_in(now, 60 + i as i64)}))
                .collect(),
        )
    };
    let first = batch("first", 25);
    let second = batch("second", 40);

    let handles: Vec<_> = [first, second]
        .into_iter()
        .map(|b| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.handler.handle_at(&b, now).await })
        })
        .collect();

    let mut added_total = 0;
    for handle in handles {
        match handle.await.unwrap() {
            IngestResponse::Success { added, .. } => added_total += added,
            other => panic!("expected success, got {:?}", other),
        }
    }

    assert_eq!(added_total, 65);
    assert_eq!(service.store.len().await, 65);
    assert_eq!(service.persisted().len(), 65);
}
