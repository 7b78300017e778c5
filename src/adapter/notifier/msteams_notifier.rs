// adapter/notifier/msteams_notifier.rs

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::adapter::notifier::alert_message::AlertMessage;
use crate::adapter::notifier::http_client::HttpDelivery;
use crate::adapter::notifier::notifier_registry::{Notifier, NotifierError};
use crate::domain::model::alert::Alert;
use crate::domain::model::delivery_status::DeliveryResponse;
use crate::domain::model::output::{OutputConfig, OutputKind};
use crate::domain::model::severity::Severity;

#[derive(Debug, Serialize)]
struct MessageCard {
    #[serde(rename = "@type")]
    card_type: &'static str,
    #[serde(rename = "@context")]
    context: &'static str,
    summary: String,
    title: String,
    #[serde(rename = "themeColor")]
    theme_color: &'static str,
    text: String,
}

fn theme_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "8B0000",
        Severity::High => "FF0000",
        Severity::Medium => "FFA500",
        Severity::Low => "FFD700",
        Severity::Info => "808080",
    }
}

fn card(alert: &Alert) -> MessageCard {
    let msg = AlertMessage::from_alert(alert);
    MessageCard {
        card_type: "MessageCard",
        context: "http://schema.org/extensions",
        summary: msg.title.clone(),
        title: msg.title,
        theme_color: theme_color(alert.severity),
        // Teams renderiza markdown: salto de línea explícito
        text: msg.body.replace('\n', "  \n"),
    }
}

/// Conector de webhook de Microsoft Teams.
pub struct MsTeamsNotifier {
    http: HttpDelivery,
}

impl MsTeamsNotifier {
    pub fn new(http: HttpDelivery) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Notifier for MsTeamsNotifier {
    fn kind(&self) -> OutputKind {
        OutputKind::MsTeams
    }

    async fn notify(&self, alert: &Alert, config: &OutputConfig) -> Result<DeliveryResponse, NotifierError> {
        let OutputConfig::MsTeams { webhook_url } = config else {
            return Err(NotifierError::ConfigMismatch { notifier: self.kind(), received: config.kind() });
        };

        let response = self.http.post_json(webhook_url, &card(alert), &[]).await;
        info!(alert_id = alert.log_id(), status = response.status_code, "msteams delivery attempted");
        Ok(response)
    }
}
