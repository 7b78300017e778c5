// adapter/notifier/notifier_registry.rs

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::adapter::notifier::http_client::HttpDelivery;
use crate::adapter::notifier::{
    msteams_notifier::MsTeamsNotifier, opsgenie_notifier::OpsgenieNotifier,
    pagerduty_notifier::PagerDutyNotifier, slack_notifier::SlackNotifier,
    webhook_notifier::WebhookNotifier,
};
use crate::domain::model::alert::Alert;
use crate::domain::model::delivery_status::DeliveryResponse;
use crate::domain::model::output::{OutputConfig, OutputKind};

/// Fallos internos de un notifier. Nunca se reintentan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifierError {
    /// La configuración del output no corresponde al tipo del notifier.
    #[error("{notifier} notifier received {received} configuration")]
    ConfigMismatch { notifier: OutputKind, received: OutputKind },

    /// Error interno del notifier (serialización, cliente mal construido, etc).
    #[error("notifier internal error: {0}")]
    Internal(String),
}

/// Interfaz común para cualquier canal de salida.
///
/// Contrato: `notify` nunca hace panic; cualquier fallo interno se devuelve como
/// `NotifierError`. Los fallos del destino (HTTP 4xx/5xx, red) se expresan en
/// el `DeliveryResponse` con `permanent` según corresponda.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tipo de output que atiende este notifier.
    fn kind(&self) -> OutputKind;

    async fn notify(&self, alert: &Alert, config: &OutputConfig) -> Result<DeliveryResponse, NotifierError>;
}

/// Registro de notifiers por tipo de output. Se construye una vez al arrancar
/// y es inmutable después (se comparte vía `Arc`).
#[derive(Default)]
pub struct NotifierRegistry {
    notifiers: HashMap<OutputKind, Arc<dyn Notifier>>,
}

impl NotifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registro con los canales HTTP incluidos (Slack, Teams, PagerDuty, Opsgenie, webhook).
    pub fn with_http_notifiers(http: HttpDelivery) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SlackNotifier::new(http.clone())));
        registry.register(Arc::new(MsTeamsNotifier::new(http.clone())));
        registry.register(Arc::new(PagerDutyNotifier::new(http.clone())));
        registry.register(Arc::new(OpsgenieNotifier::new(http.clone())));
        registry.register(Arc::new(WebhookNotifier::new(http)));
        registry
    }

    /// Registrar un notifier; reemplaza el anterior del mismo tipo.
    pub fn register(&mut self, notifier: Arc<dyn Notifier>) {
        let kind = notifier.kind();
        if self.notifiers.insert(kind, notifier).is_some() {
            warn!(output_type = %kind, "replacing previously registered notifier");
        } else {
            info!(output_type = %kind, "registered notifier");
        }
    }

    pub fn get(&self, kind: OutputKind) -> Option<Arc<dyn Notifier>> {
        self.notifiers.get(&kind).cloned()
    }

    pub fn kinds(&self) -> Vec<OutputKind> {
        let mut kinds: Vec<OutputKind> = self.notifiers.keys().copied().collect();
        kinds.sort();
        kinds
    }
}
