// src/domain/model/delivery_status.rs
//! Modelo de estado de entrega.
//!
//! - `DeliveryResponse`: lo que devuelve un canal tras un intento.
//! - `DispatchStatus`: resultado de un par (alerta, output) dentro de un ciclo de despacho.
//! - `DeliveryRecord`: la parte persistible de un `DispatchStatus`.
//! - `AlertSummary`: resumen que devuelve la API de actualización de alertas.
//!
//! Invariante: `success` y `needs_retry` nunca son ambos `true`. Ambos flags son privados:
//! un estado solo se obtiene de los constructores o de un JSON que respete la invariante.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::model::alert::Alert;
use crate::domain::model::severity::Severity;

pub const UNSUPPORTED_OUTPUT_MESSAGE: &str = "unsupported output type";
pub const PANIC_MESSAGE: &str = "panic sending alert";

/// Respuesta de un canal. `permanent` indica que reintentar no sirve (config inválida, 4xx).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResponse {
    pub status_code: u16,
    pub message: String,
    pub success: bool,
    pub permanent: bool,
}

impl DeliveryResponse {
    pub fn ok(status_code: u16, message: impl Into<String>) -> Self {
        Self { status_code, message: message.into(), success: true, permanent: false }
    }

    pub fn transient(status_code: u16, message: impl Into<String>) -> Self {
        Self { status_code, message: message.into(), success: false, permanent: false }
    }

    pub fn permanent(status_code: u16, message: impl Into<String>) -> Self {
        Self { status_code, message: message.into(), success: false, permanent: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDispatchStatus")]
pub struct DispatchStatus {
    pub alert: Alert,
    pub output_id: String,
    pub status_code: u16,
    pub message: String,
    success: bool,
    needs_retry: bool,
    pub dispatched_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDispatchStatus {
    alert: Alert,
    output_id: String,
    status_code: u16,
    message: String,
    success: bool,
    needs_retry: bool,
    dispatched_at: DateTime<Utc>,
}

impl TryFrom<RawDispatchStatus> for DispatchStatus {
    type Error = String;

    fn try_from(raw: RawDispatchStatus) -> Result<Self, Self::Error> {
        if raw.success && raw.needs_retry {
            return Err(format!("status for output {} is both successful and retryable", raw.output_id));
        }
        Ok(Self {
            alert: raw.alert,
            output_id: raw.output_id,
            status_code: raw.status_code,
            message: raw.message,
            success: raw.success,
            needs_retry: raw.needs_retry,
            dispatched_at: raw.dispatched_at,
        })
    }
}

impl DispatchStatus {
    /// Traduce la respuesta del canal. La permanencia siempre gana:
    /// un canal que reporta éxito y a la vez `permanent` queda como fallo no reintentable.
    pub fn from_response(alert: Alert, output_id: impl Into<String>, response: DeliveryResponse) -> Self {
        let success = response.success && !response.permanent;
        let needs_retry = !response.success && !response.permanent;
        Self {
            alert,
            output_id: output_id.into(),
            status_code: response.status_code,
            message: response.message,
            success,
            needs_retry,
            dispatched_at: Utc::now(),
        }
    }

    /// Fallo permanente sintetizado por el propio motor (tipo no soportado, panic, error del canal).
    pub fn permanent_failure(alert: Alert, output_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            alert,
            output_id: output_id.into(),
            status_code: 500,
            message: message.into(),
            success: false,
            needs_retry: false,
            dispatched_at: Utc::now(),
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    /// Fallo transitorio: candidato a reintento.
    pub fn needs_retry(&self) -> bool {
        self.needs_retry
    }

    pub fn record(&self) -> DeliveryRecord {
        DeliveryRecord {
            output_id: self.output_id.clone(),
            status_code: self.status_code,
            success: self.success,
            message: self.message.clone(),
            dispatched_at: self.dispatched_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRecord {
    pub output_id: String,
    pub status_code: u16,
    pub success: bool,
    pub message: String,
    pub dispatched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSummary {
    pub alert_id: String,
    pub analysis_id: String,
    pub title: String,
    pub severity: Severity,
    pub delivery_responses: Vec<DeliveryRecord>,
    pub last_updated_at: DateTime<Utc>,
}
