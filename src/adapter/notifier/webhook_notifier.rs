// adapter/notifier/webhook_notifier.rs

use async_trait::async_trait;
use tracing::info;

use crate::adapter::notifier::http_client::HttpDelivery;
use crate::adapter::notifier::notifier_registry::{Notifier, NotifierError};
use crate::domain::model::alert::Alert;
use crate::domain::model::delivery_status::DeliveryResponse;
use crate::domain::model::output::{OutputConfig, OutputKind};

/// Webhook genérico: se envía la alerta tal cual, en su formato JSON.
pub struct WebhookNotifier {
    http: HttpDelivery,
}

impl WebhookNotifier {
    pub fn new(http: HttpDelivery) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn kind(&self) -> OutputKind {
        OutputKind::CustomWebhook
    }

    async fn notify(&self, alert: &Alert, config: &OutputConfig) -> Result<DeliveryResponse, NotifierError> {
        let OutputConfig::CustomWebhook { webhook_url } = config else {
            return Err(NotifierError::ConfigMismatch { notifier: self.kind(), received: config.kind() });
        };

        let response = self.http.post_json(webhook_url, alert, &[]).await;
        info!(alert_id = alert.log_id(), status = response.status_code, "webhook delivery attempted");
        Ok(response)
    }
}
