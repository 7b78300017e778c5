// src/usecase/dispatch_alerts.rs

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::domain::error::DeliveryError;
use crate::domain::model::alert::Alert;
use crate::repository::work_queue::QueueMessage;
use crate::service::output_resolver::resolve_batch;
use crate::usecase::alert_delivery::AlertDeliveryService;

/// Counts for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    pub received: usize,
    pub invalid: usize,
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub retries_scheduled: usize,
}

impl AlertDeliveryService {
    /// Batch path. Malformed messages are dropped one by one; per-alert problems end up as
    /// retries or logged drops. Only an outputs fetch failure or an unserializable retry
    /// fails the whole batch.
    pub async fn dispatch_alerts(&self, messages: &[QueueMessage]) -> Result<DispatchSummary, DeliveryError> {
        let mut summary = DispatchSummary { received: messages.len(), ..Default::default() };

        let alerts: Vec<Alert> = messages.iter().filter_map(parse_message).collect();
        summary.invalid = summary.received - alerts.len();
        if alerts.is_empty() {
            return Ok(summary);
        }

        let outputs = self.outputs(false).await?;
        let map = resolve_batch(alerts, &outputs);
        for (alert, targets) in &map {
            if targets.is_empty() {
                debug!(alert_id = alert.log_id(), severity = %alert.severity, "no destination for alert");
            }
        }

        let (statuses, _summaries) = self.dispatch_and_record(map).await;
        summary.dispatched = statuses.len();
        summary.succeeded = statuses.iter().filter(|s| s.success()).count();
        summary.failed = summary.dispatched - summary.succeeded;

        summary.retries_scheduled = self.retries.schedule_retries(&statuses).await.map_err(|e| {
            error!(error = %e, "failed to serialize retries");
            DeliveryError::fatal("failed to schedule retries")
        })?;

        info!(
            received = summary.received,
            invalid = summary.invalid,
            dispatched = summary.dispatched,
            succeeded = summary.succeeded,
            failed = summary.failed,
            retries = summary.retries_scheduled,
            "alert batch dispatched"
        );
        Ok(summary)
    }
}

fn parse_message(message: &QueueMessage) -> Option<Alert> {
    let alert = match Alert::from_json(&message.body) {
        Ok(alert) => alert,
        Err(e) => {
            warn!(message_id = %message.message_id, error = %e, "dropping malformed queue message");
            return None;
        }
    };
    if let Err(reason) = alert.validate() {
        warn!(message_id = %message.message_id, alert_id = alert.log_id(), reason = %reason, "dropping invalid alert");
        return None;
    }
    Some(alert)
}
