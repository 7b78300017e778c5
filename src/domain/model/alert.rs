// src/domain/model/alert.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::domain::model::severity::Severity;

/// Tipo de análisis que originó la alerta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertType {
    /// Alerta derivada de una regla de detección sobre logs.
    Rule,
    /// Alerta derivada de una política sobre recursos cloud.
    Policy,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertType::Rule => f.write_str("RULE"),
            AlertType::Policy => f.write_str("POLICY"),
        }
    }
}

/// Unidad de entrega. Es también el formato de los mensajes en la work queue
/// (JSON camelCase), por lo que cualquier cambio de campos es un cambio de wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Identificador estable; `None` mientras la alerta no se ha persistido (ej. alertas de prueba).
    #[serde(default)]
    pub alert_id: Option<String>,

    pub analysis_id: String,

    #[serde(default)]
    pub analysis_name: Option<String>,

    #[serde(default)]
    pub analysis_description: String,

    #[serde(rename = "type")]
    pub alert_type: AlertType,

    pub created_at: DateTime<Utc>,

    pub severity: Severity,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub runbook: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Versión del análisis que generó la alerta.
    #[serde(default)]
    pub version: Option<String>,

    /// Destinos explícitos. Vacío => ruteo por severidad.
    #[serde(default)]
    pub output_ids: Vec<String>,

    /// Contador de reintentos; nunca decrece.
    #[serde(default)]
    pub retry_count: u32,

    #[serde(default)]
    pub is_test: bool,

    #[serde(default)]
    pub is_resent: bool,

    /// Contexto libre adjuntado por el motor de detección.
    #[serde(default, skip_serializing_if = "JsonValue::is_null")]
    pub context: JsonValue,
}

impl Alert {
    /// Validación aplicada a cada mensaje leído de la cola.
    pub fn validate(&self) -> Result<(), String> {
        if self.analysis_id.trim().is_empty() {
            return Err("analysisId is required".to_string());
        }
        if self.output_ids.iter().any(|id| id.trim().is_empty()) {
            return Err("outputIds must not contain empty ids".to_string());
        }
        if let Some(id) = &self.alert_id {
            if id.trim().is_empty() {
                return Err("alertId must not be empty when present".to_string());
            }
        }
        Ok(())
    }

    /// Copia para reintento: un único output (el que falló) y el contador incrementado.
    pub fn for_retry(&self, output_id: &str) -> Alert {
        let mut retry = self.clone();
        retry.retry_count = self.retry_count.saturating_add(1);
        retry.output_ids = vec![output_id.to_string()];
        retry
    }

    /// Nombre legible del análisis, con el id como fallback.
    pub fn analysis_display_name(&self) -> &str {
        match &self.analysis_name {
            Some(name) if !name.is_empty() => name,
            _ => &self.analysis_id,
        }
    }

    /// Id para logs; las alertas sin persistir aparecen como "-".
    pub fn log_id(&self) -> &str {
        self.alert_id.as_deref().unwrap_or("-")
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Alert> {
        Ok(serde_json::from_str(raw)?)
    }
}
