// src/service/status_recorder.rs
//! Status recorder
//!
//! Persists the delivery outcome of each tracked alert through `AlertStore::update_delivery`.
//! Only rule alerts with an id are tracked; policy alerts and test alerts are skipped.
//! One update task per alert, all updates in parallel. A failed update is logged and
//! left out of the result; it never fails the call.

use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error};

use crate::domain::model::alert::AlertType;
use crate::domain::model::delivery_status::{AlertSummary, DeliveryRecord, DispatchStatus};
use crate::repository::alert_store::AlertStore;

#[derive(Clone)]
pub struct StatusRecorder {
    store: Arc<dyn AlertStore>,
}

impl StatusRecorder {
    pub fn new(store: Arc<dyn AlertStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, statuses: &[DispatchStatus]) -> Vec<AlertSummary> {
        let grouped = group_by_alert(statuses);
        if grouped.is_empty() {
            return Vec::new();
        }

        let tasks = grouped.into_iter().map(|(alert_id, records)| {
            let store = Arc::clone(&self.store);
            tokio::spawn(async move {
                let count = records.len();
                match store.update_delivery(&alert_id, records).await {
                    Ok(summary) => {
                        debug!(alert_id = %alert_id, records = count, "recorded delivery statuses");
                        Some(summary)
                    }
                    Err(e) => {
                        error!(alert_id = %alert_id, error = %e, "failed to record delivery statuses");
                        None
                    }
                }
            })
        });

        join_all(tasks)
            .await
            .into_iter()
            .filter_map(|res| match res {
                Ok(summary) => summary,
                Err(e) => {
                    error!(error = %e, "status update task failed");
                    None
                }
            })
            .collect()
    }
}

/// Delivery records per tracked alert id, in status order within each alert.
fn group_by_alert(statuses: &[DispatchStatus]) -> BTreeMap<String, Vec<DeliveryRecord>> {
    let mut grouped: BTreeMap<String, Vec<DeliveryRecord>> = BTreeMap::new();
    for status in statuses {
        let alert = &status.alert;
        if alert.alert_type != AlertType::Rule || alert.is_test {
            continue;
        }
        if let Some(id) = &alert.alert_id {
            grouped.entry(id.clone()).or_default().push(status.record());
        }
    }
    grouped
}
