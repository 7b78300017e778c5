// tests/integration/dispatch_flow_test.rs

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use alert_delivery_service::domain::error::DeliveryError;
use alert_delivery_service::domain::model::alert::AlertType;
use alert_delivery_service::domain::model::severity::Severity;
use alert_delivery_service::repository::alert_store::AlertStore;
use alert_delivery_service::repository::work_queue::{QueueEntry, WorkQueue};
use alert_delivery_service::scheduler::queue_poller::{QueuePoller, QueuePollerConfig};
use alert_delivery_service::scheduler::retry_scheduler::RetryPolicy;
use alert_delivery_service::usecase::dispatch_alerts::DispatchSummary;
use anyhow::Result;
use common::{alert_record, message, raw_message, rule_alert, webhook_output, Behavior, Harness};

fn policy(max_retry_count: u32) -> RetryPolicy {
    RetryPolicy { max_retry_count, min_delay_secs: 10, max_delay_secs: 10 }
}

#[tokio::test(start_paused = true)]
async fn partial_failure_records_both_and_retries_the_failed_output() -> Result<()> {
    let h = Harness::new(
        vec![webhook_output("X", &[Severity::High]), webhook_output("Y", &[Severity::High])],
        &[("Y", Behavior::Transient)],
        policy(3),
    );
    h.alerts.insert(alert_record("a-1", Severity::High)).await;

    let summary = h
        .service
        .dispatch_alerts(&[message(&rule_alert("a-1", Severity::High, &[]))])
        .await?;
    assert_eq!(
        summary,
        DispatchSummary { received: 1, invalid: 0, dispatched: 2, succeeded: 1, failed: 1, retries_scheduled: 1 }
    );

    let stored = h.alerts.get_alert("a-1").await?.expect("stored alert");
    let mut outcomes: Vec<(String, bool)> = stored
        .delivery_responses
        .iter()
        .map(|r| (r.output_id.clone(), r.success))
        .collect();
    outcomes.sort();
    assert_eq!(outcomes, vec![("X".to_string(), true), ("Y".to_string(), false)]);

    let retries = h.drain_queue().await;
    assert_eq!(retries.len(), 1);
    assert_eq!(retries[0].output_ids, vec!["Y".to_string()]);
    assert_eq!(retries[0].retry_count, 1);
    Ok(())
}

#[tokio::test]
async fn malformed_and_invalid_messages_are_dropped() -> Result<()> {
    let h = Harness::new(vec![webhook_output("X", &Severity::ALL)], &[], policy(3));

    let mut invalid = rule_alert("a-2", Severity::Low, &[]);
    invalid.analysis_id = "  ".into();

    let summary = h
        .service
        .dispatch_alerts(&[
            raw_message("{not json"),
            message(&invalid),
            message(&rule_alert("a-3", Severity::Low, &[])),
        ])
        .await?;

    assert_eq!(summary.received, 3);
    assert_eq!(summary.invalid, 2);
    assert_eq!(summary.dispatched, 1);
    assert_eq!(h.notifier.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn batch_of_only_garbage_skips_the_output_store() -> Result<()> {
    let h = Harness::new(vec![webhook_output("X", &Severity::ALL)], &[], policy(3));

    let summary = h.service.dispatch_alerts(&[raw_message("[]")]).await?;
    assert_eq!(summary.invalid, 1);
    assert_eq!(summary.dispatched, 0);
    assert_eq!(h.outputs.fetch_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn retry_for_a_deleted_output_is_not_dispatched() -> Result<()> {
    let h = Harness::new(vec![webhook_output("X", &[Severity::Medium])], &[], policy(3));

    let mut retry = rule_alert("a-1", Severity::Medium, &["Z"]);
    retry.retry_count = 1;
    let summary = h.service.dispatch_alerts(&[message(&retry)]).await?;

    assert_eq!(summary.dispatched, 0);
    assert_eq!(summary.retries_scheduled, 0);
    assert_eq!(h.notifier.call_count(), 0);
    assert!(h.drain_queue().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn output_store_failure_fails_the_batch_as_retryable() -> Result<()> {
    let h = Harness::new(vec![webhook_output("X", &Severity::ALL)], &[], policy(3));
    h.outputs.set_failure(Some("table unavailable".into())).await;

    let err = h
        .service
        .dispatch_alerts(&[message(&rule_alert("a-1", Severity::Info, &[]))])
        .await
        .unwrap_err();
    assert_eq!(err, DeliveryError::internal("failed to fetch outputs"));
    assert!(err.is_retryable());
    assert_eq!(h.notifier.call_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn panicking_and_permanent_outputs_are_not_retried() -> Result<()> {
    let h = Harness::new(
        vec![
            webhook_output("ok", &[Severity::Critical]),
            webhook_output("boom", &[Severity::Critical]),
            webhook_output("rejects", &[Severity::Critical]),
            webhook_output("broken", &[Severity::Critical]),
        ],
        &[("boom", Behavior::Panic), ("rejects", Behavior::Permanent), ("broken", Behavior::Error)],
        policy(3),
    );

    let summary = h
        .service
        .dispatch_alerts(&[message(&rule_alert("a-1", Severity::Critical, &[]))])
        .await?;
    assert_eq!(summary.dispatched, 4);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 3);
    assert_eq!(summary.retries_scheduled, 0);
    assert!(h.drain_queue().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn policy_and_untracked_alerts_are_not_recorded() -> Result<()> {
    let h = Harness::new(vec![webhook_output("X", &Severity::ALL)], &[], policy(3));
    let mut policy_record = alert_record("p-1", Severity::Medium);
    policy_record.alert_type = AlertType::Policy;
    h.alerts.insert(policy_record).await;

    let mut policy_alert = rule_alert("p-1", Severity::Medium, &[]);
    policy_alert.alert_type = AlertType::Policy;
    let mut untracked = rule_alert("ignored", Severity::Medium, &[]);
    untracked.alert_id = None;

    let summary = h
        .service
        .dispatch_alerts(&[message(&policy_alert), message(&untracked)])
        .await?;
    assert_eq!(summary.succeeded, 2);

    let stored = h.alerts.get_alert("p-1").await?.expect("stored alert");
    assert!(stored.delivery_responses.is_empty());
    assert!(stored.updated_at.is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn poller_puts_a_failed_batch_back_with_the_same_ids() -> Result<()> {
    let h = Harness::new(vec![webhook_output("X", &Severity::ALL)], &[], policy(3));
    let poller = QueuePoller::new(
        h.queue.clone(),
        h.service.clone(),
        QueuePollerConfig { requeue_delay: Duration::from_secs(10), ..Default::default() },
    );

    let original = message(&rule_alert("a-1", Severity::Low, &[]));
    h.queue
        .send_batch(vec![QueueEntry { id: original.message_id.clone(), body: original.body.clone(), delay: Duration::ZERO }])
        .await?;

    h.outputs.set_failure(Some("throttled".into())).await;
    assert_eq!(poller.run_once().await, 0);
    assert!(h.queue.receive_ready(10).await.is_empty());
    assert_eq!(h.queue.len().await, 1);

    h.outputs.set_failure(None).await;
    tokio::time::advance(Duration::from_secs(10)).await;
    let ready = h.queue.receive_ready(10).await;
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].message_id, original.message_id);
    assert_eq!(h.notifier.call_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn transient_output_is_retried_until_the_ceiling() -> Result<()> {
    let h = Harness::new(
        vec![webhook_output("X", &[Severity::High]), webhook_output("Y", &[Severity::High])],
        &[("Y", Behavior::Transient)],
        policy(2),
    );
    h.alerts.insert(alert_record("a-1", Severity::High)).await;
    let poller = Arc::new(QueuePoller::new(h.queue.clone(), h.service.clone(), QueuePollerConfig::default()));

    let first = message(&rule_alert("a-1", Severity::High, &[]));
    h.queue.send_batch(vec![QueueEntry::new(first.body, Duration::ZERO)]).await?;

    let mut rounds = 0;
    loop {
        if poller.drain().await == 0 {
            break;
        }
        rounds += 1;
        tokio::time::advance(Duration::from_secs(10)).await;
    }

    assert_eq!(rounds, 3);
    let calls = h.notifier.calls();
    assert_eq!(calls.iter().filter(|(url, _)| url == "X").count(), 1);
    let y_calls: Vec<u32> = calls.iter().filter(|(url, _)| url == "Y").map(|(_, a)| a.retry_count).collect();
    assert_eq!(y_calls, vec![0, 1, 2]);
    assert!(h.queue.is_empty().await);

    let stored = h.alerts.get_alert("a-1").await?.expect("stored alert");
    assert_eq!(stored.delivery_responses.len(), 4);
    Ok(())
}
