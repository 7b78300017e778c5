// src/usecase/alert_delivery.rs
//! Alert delivery service: the three entry points share these stages.
//!
//! - `deliver_alert` (deliver_alert.rs): re-send a stored alert to caller-named outputs.
//! - `dispatch_alerts` (dispatch_alerts.rs): batch path fed by the work queue.
//! - `send_test_alert` (send_test_alert.rs): synthetic alert to caller-named outputs.

use std::sync::Arc;
use tracing::error;

use crate::domain::error::DeliveryError;
use crate::domain::model::delivery_status::{AlertSummary, DispatchStatus};
use crate::domain::model::output::Output;
use crate::repository::alert_store::{AlertStore, AnalysisStore};
use crate::scheduler::retry_scheduler::RetryScheduler;
use crate::service::notification_dispatcher::NotificationDispatcher;
use crate::service::output_resolver::AlertOutputMap;
use crate::service::outputs_cache::OutputsCache;
use crate::service::status_recorder::StatusRecorder;

pub struct AlertDeliveryService {
    pub(crate) cache: Arc<OutputsCache>,
    pub(crate) dispatcher: NotificationDispatcher,
    pub(crate) recorder: StatusRecorder,
    pub(crate) retries: RetryScheduler,
    pub(crate) alerts: Arc<dyn AlertStore>,
    pub(crate) analyses: Arc<dyn AnalysisStore>,
}

impl AlertDeliveryService {
    pub fn new(
        cache: Arc<OutputsCache>,
        dispatcher: NotificationDispatcher,
        recorder: StatusRecorder,
        retries: RetryScheduler,
        alerts: Arc<dyn AlertStore>,
        analyses: Arc<dyn AnalysisStore>,
    ) -> Self {
        Self { cache, dispatcher, recorder, retries, alerts, analyses }
    }

    /// Current outputs from the cache; `fresh` forces a refetch first.
    pub(crate) async fn outputs(&self, fresh: bool) -> Result<Arc<Vec<Output>>, DeliveryError> {
        if fresh {
            self.cache.invalidate().await;
        }
        self.cache.get().await.map_err(|e| {
            error!(error = %e, "failed to fetch outputs");
            DeliveryError::internal("failed to fetch outputs")
        })
    }

    /// Dispatch every pair, then record the outcome of tracked alerts.
    pub(crate) async fn dispatch_and_record(&self, map: AlertOutputMap) -> (Vec<DispatchStatus>, Vec<AlertSummary>) {
        let statuses = self.dispatcher.dispatch(map).await;
        let summaries = self.recorder.record(&statuses).await;
        (statuses, summaries)
    }
}

/// "N of M destinations failed", or `None` when everything succeeded.
pub(crate) fn failed_destinations(statuses: &[DispatchStatus]) -> Option<DeliveryError> {
    let failed = statuses.iter().filter(|s| !s.success()).count();
    if failed == 0 {
        return None;
    }
    Some(DeliveryError::internal(format!("{} of {} destinations failed", failed, statuses.len())))
}
