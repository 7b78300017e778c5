// src/usecase/deliver_alert.rs

use tracing::{error, info, warn};

use crate::domain::error::DeliveryError;
use crate::domain::model::alert::Alert;
use crate::domain::model::delivery_status::AlertSummary;
use crate::repository::alert_store::{AlertRecord, AnalysisRecord};
use crate::service::output_resolver::resolve_for_destinations;
use crate::usecase::alert_delivery::{failed_destinations, AlertDeliveryService};

impl AlertDeliveryService {
    /// Re-send a stored alert to the outputs named by the caller.
    ///
    /// The alert is rebuilt from the stored record plus the current analysis metadata and
    /// the output list is fetched fresh. Failed destinations are reported as one `Internal`
    /// error after the successful ones have been recorded.
    pub async fn deliver_alert(&self, alert_id: &str, output_ids: &[String]) -> Result<Vec<AlertSummary>, DeliveryError> {
        if output_ids.is_empty() {
            return Err(DeliveryError::invalid_input("at least one output id is required"));
        }

        let record = self
            .alerts
            .get_alert(alert_id)
            .await
            .map_err(|e| {
                error!(alert_id, error = %e, "failed to fetch alert");
                DeliveryError::internal("failed to fetch alert")
            })?
            .ok_or_else(|| DeliveryError::not_found(format!("alert {}", alert_id)))?;

        let analysis = self
            .analyses
            .get_analysis(&record.analysis_id, record.analysis_version.as_deref())
            .await
            .map_err(|e| {
                error!(alert_id, analysis_id = %record.analysis_id, error = %e, "failed to fetch analysis");
                DeliveryError::internal("failed to fetch analysis")
            })?
            .ok_or_else(|| {
                warn!(alert_id, analysis_id = %record.analysis_id, "analysis referenced by alert not found");
                DeliveryError::internal(format!("analysis {} not found", record.analysis_id))
            })?;

        let alert = resend_alert(record, analysis, output_ids);
        let outputs = self.outputs(true).await?;
        let map = resolve_for_destinations(vec![alert], &outputs, output_ids)?;

        let (statuses, summaries) = self.dispatch_and_record(map).await;
        info!(alert_id, destinations = statuses.len(), "alert re-delivered");

        match failed_destinations(&statuses) {
            Some(err) => Err(err),
            None => Ok(summaries),
        }
    }
}

fn resend_alert(record: AlertRecord, analysis: AnalysisRecord, output_ids: &[String]) -> Alert {
    Alert {
        alert_id: Some(record.alert_id),
        analysis_id: record.analysis_id,
        analysis_name: Some(analysis.display_name).filter(|n| !n.is_empty()),
        analysis_description: analysis.description,
        alert_type: record.alert_type,
        created_at: record.created_at,
        severity: record.severity,
        title: record.title,
        runbook: analysis.runbook,
        tags: analysis.tags,
        version: record.analysis_version,
        output_ids: output_ids.to_vec(),
        retry_count: 0,
        is_test: false,
        is_resent: true,
        context: record.context,
    }
}
