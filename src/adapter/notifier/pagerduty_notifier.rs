// adapter/notifier/pagerduty_notifier.rs

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::adapter::notifier::alert_message::AlertMessage;
use crate::adapter::notifier::http_client::HttpDelivery;
use crate::adapter::notifier::notifier_registry::{Notifier, NotifierError};
use crate::domain::model::alert::Alert;
use crate::domain::model::delivery_status::DeliveryResponse;
use crate::domain::model::output::{OutputConfig, OutputKind};
use crate::domain::model::severity::Severity;

pub const PAGERDUTY_EVENTS_URL: &str = "https://events.pagerduty.com/v2/enqueue";

#[derive(Debug, Serialize)]
struct PagerDutyEvent<'a> {
    routing_key: &'a str,
    event_action: &'static str,
    payload: PagerDutyPayload,
}

#[derive(Debug, Serialize)]
struct PagerDutyPayload {
    summary: String,
    severity: &'static str,
    source: String,
    timestamp: String,
    custom_details: Value,
}

/// Niveles de Events v2: critical, error, warning, info.
fn pagerduty_severity(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "critical",
        Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low | Severity::Info => "info",
    }
}

fn event<'a>(alert: &Alert, routing_key: &'a str) -> PagerDutyEvent<'a> {
    let msg = AlertMessage::from_alert(alert);
    PagerDutyEvent {
        routing_key,
        event_action: "trigger",
        payload: PagerDutyPayload {
            summary: msg.title,
            severity: pagerduty_severity(alert.severity),
            source: alert.analysis_id.clone(),
            timestamp: alert.created_at.to_rfc3339(),
            custom_details: json!({
                "description": alert.analysis_description,
                "runbook": alert.runbook,
                "tags": alert.tags,
                "alertId": alert.alert_id,
                "context": alert.context,
            }),
        },
    }
}

pub struct PagerDutyNotifier {
    http: HttpDelivery,
    events_url: String,
}

impl PagerDutyNotifier {
    pub fn new(http: HttpDelivery) -> Self {
        Self::with_events_url(http, PAGERDUTY_EVENTS_URL)
    }

    pub fn with_events_url(http: HttpDelivery, events_url: impl Into<String>) -> Self {
        Self { http, events_url: events_url.into() }
    }
}

#[async_trait]
impl Notifier for PagerDutyNotifier {
    fn kind(&self) -> OutputKind {
        OutputKind::PagerDuty
    }

    async fn notify(&self, alert: &Alert, config: &OutputConfig) -> Result<DeliveryResponse, NotifierError> {
        let OutputConfig::PagerDuty { integration_key } = config else {
            return Err(NotifierError::ConfigMismatch { notifier: self.kind(), received: config.kind() });
        };

        let response = self.http.post_json(&self.events_url, &event(alert, integration_key), &[]).await;
        info!(alert_id = alert.log_id(), status = response.status_code, "pagerduty delivery attempted");
        Ok(response)
    }
}
