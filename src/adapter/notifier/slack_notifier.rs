// adapter/notifier/slack_notifier.rs

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::adapter::notifier::alert_message::AlertMessage;
use crate::adapter::notifier::http_client::HttpDelivery;
use crate::adapter::notifier::notifier_registry::{Notifier, NotifierError};
use crate::domain::model::alert::Alert;
use crate::domain::model::delivery_status::DeliveryResponse;
use crate::domain::model::output::{OutputConfig, OutputKind};

#[derive(Debug, Serialize, PartialEq)]
struct SlackPayload {
    text: String,
}

fn payload(alert: &Alert) -> SlackPayload {
    let msg = AlertMessage::from_alert(alert);
    SlackPayload { text: format!("*{}*\n{}", msg.title, msg.body) }
}

/// Incoming webhook de Slack.
pub struct SlackNotifier {
    http: HttpDelivery,
}

impl SlackNotifier {
    pub fn new(http: HttpDelivery) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn kind(&self) -> OutputKind {
        OutputKind::Slack
    }

    async fn notify(&self, alert: &Alert, config: &OutputConfig) -> Result<DeliveryResponse, NotifierError> {
        let OutputConfig::Slack { webhook_url } = config else {
            return Err(NotifierError::ConfigMismatch { notifier: self.kind(), received: config.kind() });
        };

        let response = self.http.post_json(webhook_url, &payload(alert), &[]).await;
        info!(alert_id = alert.log_id(), status = response.status_code, "slack delivery attempted");
        Ok(response)
    }
}
