// src/service/notification_dispatcher.rs
//! Notification dispatcher service
//!
//! Responsibilities:
//! - Deliver every (alert, output) pair concurrently, one task per pair.
//! - Collect exactly one `DispatchStatus` per launched task before returning.
//! - Turn every per-pair problem into a status instead of an error: unknown output kind,
//!   notifier error, or a panicking notifier.
//!
//! Statuses come back in pair order (alerts in map order, outputs in resolution order),
//! even though delivery itself runs in any order.

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::adapter::notifier::notifier_registry::NotifierRegistry;
use crate::domain::model::alert::Alert;
use crate::domain::model::delivery_status::{DispatchStatus, PANIC_MESSAGE, UNSUPPORTED_OUTPUT_MESSAGE};
use crate::domain::model::output::Output;
use crate::service::output_resolver::AlertOutputMap;
use crate::telemetry::metrics::{DISPATCHED_TOTAL, FAILED_TOTAL, SUCCEEDED_TOTAL};

/// Notification dispatcher main service
#[derive(Clone)]
pub struct NotificationDispatcher {
    registry: Arc<NotifierRegistry>,
    // None = fan-out sin límite (una tarea activa por par)
    in_flight: Option<Arc<Semaphore>>,
}

impl NotificationDispatcher {
    pub fn new(registry: Arc<NotifierRegistry>, max_in_flight: Option<usize>) -> Self {
        Self {
            registry,
            in_flight: max_in_flight.filter(|n| *n > 0).map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    /// Dispatch every pair in the map and return one status per pair.
    pub async fn dispatch(&self, map: AlertOutputMap) -> Vec<DispatchStatus> {
        let mut tasks = Vec::new();
        // (alert, output_id) kept outside the task so a panic can still be attributed
        let mut owners = Vec::new();

        for (alert, outputs) in map {
            for output in outputs {
                owners.push((alert.clone(), output.output_id.clone()));
                let dispatcher = self.clone();
                let alert = alert.clone();
                tasks.push(tokio::spawn(async move { dispatcher.deliver_one(alert, output).await }));
            }
        }

        if tasks.is_empty() {
            return Vec::new();
        }

        let results = join_all(tasks).await;

        results
            .into_iter()
            .zip(owners)
            .map(|(result, (alert, output_id))| match result {
                Ok(status) => status,
                Err(join_err) => {
                    error!(
                        alert_id = alert.log_id(),
                        output_id = %output_id,
                        panicked = join_err.is_panic(),
                        "delivery task did not complete"
                    );
                    metrics::increment_counter!(FAILED_TOTAL, "retryable" => "false");
                    DispatchStatus::permanent_failure(alert, output_id, PANIC_MESSAGE)
                }
            })
            .collect()
    }

    async fn deliver_one(&self, alert: Alert, output: Output) -> DispatchStatus {
        // the semaphore is never closed
        let _permit = match &self.in_flight {
            Some(sem) => Arc::clone(sem).acquire_owned().await.ok(),
            None => None,
        };

        let kind = output.kind();
        metrics::increment_counter!(DISPATCHED_TOTAL, "output_type" => kind.as_str());

        let Some(notifier) = self.registry.get(kind) else {
            warn!(alert_id = alert.log_id(), output_id = %output.output_id, output_type = %kind, "no notifier for output type");
            metrics::increment_counter!(FAILED_TOTAL, "retryable" => "false");
            return DispatchStatus::permanent_failure(alert, output.output_id, UNSUPPORTED_OUTPUT_MESSAGE);
        };

        let status = match notifier.notify(&alert, &output.config).await {
            Ok(response) => DispatchStatus::from_response(alert, output.output_id, response),
            Err(e) => {
                error!(alert_id = alert.log_id(), output_id = %output.output_id, error = %e, "notifier failed");
                DispatchStatus::permanent_failure(alert, output.output_id, e.to_string())
            }
        };

        if status.success() {
            info!(alert_id = status.alert.log_id(), output_id = %status.output_id, "alert delivered");
            metrics::increment_counter!(SUCCEEDED_TOTAL);
        } else {
            warn!(
                alert_id = status.alert.log_id(),
                output_id = %status.output_id,
                status_code = status.status_code,
                needs_retry = status.needs_retry(),
                message = %status.message,
                "alert delivery failed"
            );
            let retryable = if status.needs_retry() { "true" } else { "false" };
            metrics::increment_counter!(FAILED_TOTAL, "retryable" => retryable);
        }
        status
    }
}
