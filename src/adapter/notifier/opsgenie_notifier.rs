// adapter/notifier/opsgenie_notifier.rs

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::adapter::notifier::alert_message::AlertMessage;
use crate::adapter::notifier::http_client::HttpDelivery;
use crate::adapter::notifier::notifier_registry::{Notifier, NotifierError};
use crate::domain::model::alert::Alert;
use crate::domain::model::delivery_status::DeliveryResponse;
use crate::domain::model::output::{OpsgenieRegion, OutputConfig, OutputKind};
use crate::domain::model::severity::Severity;

/// Límite de Opsgenie para el campo `message`.
const MAX_MESSAGE_LEN: usize = 130;

#[derive(Debug, Serialize)]
struct OpsgenieAlert {
    message: String,
    description: String,
    priority: &'static str,
    tags: Vec<String>,
    source: String,
}

fn priority(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "P1",
        Severity::High => "P2",
        Severity::Medium => "P3",
        Severity::Low => "P4",
        Severity::Info => "P5",
    }
}

fn alerts_url(region: OpsgenieRegion) -> &'static str {
    match region {
        OpsgenieRegion::Us => "https://api.opsgenie.com/v2/alerts",
        OpsgenieRegion::Eu => "https://api.eu.opsgenie.com/v2/alerts",
    }
}

fn request(alert: &Alert) -> OpsgenieAlert {
    let msg = AlertMessage::from_alert(alert);
    OpsgenieAlert {
        message: msg.title.chars().take(MAX_MESSAGE_LEN).collect(),
        description: msg.body,
        priority: priority(alert.severity),
        tags: alert.tags.clone(),
        source: alert.analysis_id.clone(),
    }
}

pub struct OpsgenieNotifier {
    http: HttpDelivery,
    // solo para tests: reemplaza el host regional
    url_override: Option<String>,
}

impl OpsgenieNotifier {
    pub fn new(http: HttpDelivery) -> Self {
        Self { http, url_override: None }
    }

    pub fn with_alerts_url(http: HttpDelivery, url: impl Into<String>) -> Self {
        Self { http, url_override: Some(url.into()) }
    }
}

#[async_trait]
impl Notifier for OpsgenieNotifier {
    fn kind(&self) -> OutputKind {
        OutputKind::Opsgenie
    }

    async fn notify(&self, alert: &Alert, config: &OutputConfig) -> Result<DeliveryResponse, NotifierError> {
        let OutputConfig::Opsgenie { api_key, service_region } = config else {
            return Err(NotifierError::ConfigMismatch { notifier: self.kind(), received: config.kind() });
        };

        let url = self.url_override.as_deref().unwrap_or_else(|| alerts_url(*service_region));
        let headers = [("Authorization", format!("GenieKey {}", api_key))];
        let response = self.http.post_json(url, &request(alert), &headers).await;
        info!(alert_id = alert.log_id(), status = response.status_code, "opsgenie delivery attempted");
        Ok(response)
    }
}
