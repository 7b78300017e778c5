// src/usecase/send_test_alert.rs

use chrono::Utc;
use tracing::info;

use crate::domain::error::DeliveryError;
use crate::domain::model::alert::{Alert, AlertType};
use crate::domain::model::delivery_status::DeliveryRecord;
use crate::domain::model::severity::Severity;
use crate::service::output_resolver::resolve_for_destinations;
use crate::usecase::alert_delivery::{failed_destinations, AlertDeliveryService};

pub const TEST_ANALYSIS_ID: &str = "Test.Alert";
pub const TEST_ALERT_TITLE: &str = "This is a Test Alert";

/// Alerta sintética para probar destinos; nunca se persiste (sin id).
pub fn test_alert(output_ids: &[String]) -> Alert {
    Alert {
        alert_id: None,
        analysis_id: TEST_ANALYSIS_ID.to_string(),
        analysis_name: Some("Test Alert".to_string()),
        analysis_description: "An alert triggered to test the delivery of alert destinations".to_string(),
        alert_type: AlertType::Rule,
        created_at: Utc::now(),
        severity: Severity::Info,
        title: TEST_ALERT_TITLE.to_string(),
        runbook: "No action needed: this alert tests the destination configuration".to_string(),
        tags: vec!["test".to_string()],
        version: None,
        output_ids: output_ids.to_vec(),
        retry_count: 0,
        is_test: true,
        is_resent: false,
        context: serde_json::Value::Null,
    }
}

impl AlertDeliveryService {
    /// Send a test alert to the named outputs and report each delivery.
    pub async fn send_test_alert(&self, output_ids: &[String]) -> Result<Vec<DeliveryRecord>, DeliveryError> {
        if output_ids.is_empty() {
            return Err(DeliveryError::invalid_input("at least one output id is required"));
        }

        let outputs = self.outputs(true).await?;
        let map = resolve_for_destinations(vec![test_alert(output_ids)], &outputs, output_ids)?;
        let (statuses, _) = self.dispatch_and_record(map).await;
        info!(destinations = statuses.len(), "test alert sent");

        if let Some(err) = failed_destinations(&statuses) {
            return Err(err);
        }
        Ok(statuses.iter().map(|s| s.record()).collect())
    }
}
