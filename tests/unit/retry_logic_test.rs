// tests/unit/retry_logic_test.rs

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use alert_delivery_service::domain::model::delivery_status::{DeliveryResponse, DispatchStatus};
use alert_delivery_service::domain::model::severity::Severity;
use alert_delivery_service::repository::work_queue::InMemoryWorkQueue;
use alert_delivery_service::scheduler::retry_scheduler::{RetryPolicy, RetryScheduler, RETRY_CHUNK_SIZE};
use anyhow::Result;
use common::{rule_alert, CapturingQueue, FailingQueue};

fn policy(max_retry_count: u32) -> RetryPolicy {
    RetryPolicy { max_retry_count, min_delay_secs: 10, max_delay_secs: 30 }
}

fn transient(alert: &alert_delivery_service::domain::model::alert::Alert, output: &str) -> DispatchStatus {
    DispatchStatus::from_response(alert.clone(), output, DeliveryResponse::transient(500, "boom"))
}

#[tokio::test]
async fn transient_failure_enqueues_single_output_retry() -> Result<()> {
    let queue = Arc::new(CapturingQueue::default());
    let scheduler = RetryScheduler::new(queue.clone(), policy(3));

    let alert = rule_alert("a-1", Severity::High, &[]);
    let statuses = vec![
        DispatchStatus::from_response(alert.clone(), "X", DeliveryResponse::ok(200, "ok")),
        transient(&alert, "Y"),
    ];

    let scheduled = scheduler.schedule_retries(&statuses).await?;
    assert_eq!(scheduled, 1);

    let retries = queue.alerts();
    assert_eq!(retries.len(), 1);
    assert_eq!(retries[0].output_ids, vec!["Y".to_string()]);
    assert_eq!(retries[0].retry_count, 1);
    assert_eq!(retries[0].alert_id.as_deref(), Some("a-1"));
    Ok(())
}

#[tokio::test]
async fn alerts_at_the_ceiling_are_dropped() -> Result<()> {
    let queue = Arc::new(CapturingQueue::default());
    let scheduler = RetryScheduler::new(queue.clone(), policy(3));

    let mut exhausted = rule_alert("a-1", Severity::High, &["Y"]);
    exhausted.retry_count = 3;
    let mut beyond = rule_alert("a-2", Severity::High, &["Y"]);
    beyond.retry_count = 7;

    let scheduled = scheduler
        .schedule_retries(&[transient(&exhausted, "Y"), transient(&beyond, "Y")])
        .await?;
    assert_eq!(scheduled, 0);
    assert!(queue.entries().is_empty());
    Ok(())
}

#[tokio::test]
async fn permanent_failures_are_never_enqueued() -> Result<()> {
    let queue = Arc::new(CapturingQueue::default());
    let scheduler = RetryScheduler::new(queue.clone(), policy(3));

    let alert = rule_alert("a-1", Severity::Low, &[]);
    let statuses = vec![
        DispatchStatus::from_response(alert.clone(), "X", DeliveryResponse::permanent(404, "gone")),
        DispatchStatus::permanent_failure(alert.clone(), "Y", "unsupported output type"),
    ];
    assert_eq!(scheduler.schedule_retries(&statuses).await?, 0);
    assert!(queue.entries().is_empty());
    Ok(())
}

#[tokio::test]
async fn multi_output_failure_splits_into_independent_retries() -> Result<()> {
    let queue = Arc::new(CapturingQueue::default());
    let scheduler = RetryScheduler::new(queue.clone(), policy(5));

    let mut alert = rule_alert("a-1", Severity::Critical, &[]);
    alert.retry_count = 2;
    let failed = ["A", "B", "C"];
    let statuses: Vec<DispatchStatus> = failed.iter().map(|o| transient(&alert, o)).collect();

    assert_eq!(scheduler.schedule_retries(&statuses).await?, 3);

    let mut outputs: Vec<String> = Vec::new();
    for retry in queue.alerts() {
        assert_eq!(retry.retry_count, 3);
        assert_eq!(retry.output_ids.len(), 1);
        outputs.push(retry.output_ids[0].clone());
    }
    outputs.sort();
    assert_eq!(outputs, vec!["A", "B", "C"]);
    Ok(())
}

#[tokio::test]
async fn retries_are_sent_in_chunks_with_delays_in_window() -> Result<()> {
    let queue = Arc::new(CapturingQueue::default());
    let scheduler = RetryScheduler::new(queue.clone(), policy(5));

    let statuses: Vec<DispatchStatus> = (0..25)
        .map(|i| transient(&rule_alert(&format!("a-{i}"), Severity::Medium, &[]), "X"))
        .collect();
    assert_eq!(scheduler.schedule_retries(&statuses).await?, 25);

    let sizes: Vec<usize> = queue.batches.lock().unwrap().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![RETRY_CHUNK_SIZE, RETRY_CHUNK_SIZE, 5]);

    for entry in queue.entries() {
        assert!(entry.delay >= Duration::from_secs(10));
        assert!(entry.delay < Duration::from_secs(30));
    }
    Ok(())
}

#[tokio::test]
async fn queue_failure_is_swallowed() -> Result<()> {
    let queue = Arc::new(FailingQueue::default());
    let scheduler = RetryScheduler::new(queue.clone(), policy(5));

    let statuses: Vec<DispatchStatus> = (0..12)
        .map(|i| transient(&rule_alert(&format!("a-{i}"), Severity::Medium, &[]), "X"))
        .collect();

    let scheduled = scheduler.schedule_retries(&statuses).await?;
    assert_eq!(scheduled, 0);
    assert_eq!(*queue.attempts.lock().unwrap(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn retries_become_visible_after_their_delay() -> Result<()> {
    let queue = Arc::new(InMemoryWorkQueue::new());
    let scheduler = RetryScheduler::new(
        queue.clone(),
        RetryPolicy { max_retry_count: 3, min_delay_secs: 20, max_delay_secs: 20 },
    );

    let alert = rule_alert("a-1", Severity::High, &[]);
    scheduler.schedule_retries(&[transient(&alert, "Y")]).await?;

    assert!(queue.receive_ready(10).await.is_empty());
    tokio::time::advance(Duration::from_secs(20)).await;
    let ready = queue.receive_ready(10).await;
    assert_eq!(ready.len(), 1);
    Ok(())
}
