// src/repository/alert_store.rs
//! Alert store abstractions and implementations.
//!
//! This module provides:
//! - `AlertStore` trait: fetch a stored alert by id and append delivery records to it.
//! - `AnalysisStore` trait: fetch the metadata of the analysis (rule/policy) behind an alert.
//! - `InMemoryAlertStore` / `InMemoryAnalysisStore` for tests and local dev, optionally
//!   seeded from YAML files.

use async_trait::async_trait;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::model::alert::AlertType;
use crate::domain::model::delivery_status::{AlertSummary, DeliveryRecord};
use crate::domain::model::severity::Severity;
use crate::telemetry::metrics::ALERT_STORE_DELIVERY_UPDATES;

/// Alert as persisted by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub alert_id: String,
    pub analysis_id: String,
    #[serde(default)]
    pub analysis_version: Option<String>,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    #[serde(default)]
    pub title: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub context: Value,
    #[serde(default)]
    pub delivery_responses: Vec<DeliveryRecord>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AlertRecord {
    pub fn summary(&self) -> AlertSummary {
        AlertSummary {
            alert_id: self.alert_id.clone(),
            analysis_id: self.analysis_id.clone(),
            title: self.title.clone(),
            severity: self.severity,
            delivery_responses: self.delivery_responses.clone(),
            last_updated_at: self.updated_at.unwrap_or(self.created_at),
        }
    }
}

/// Metadata of a rule or policy, as of a given version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub runbook: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[async_trait]
pub trait AlertStore: Send + Sync + 'static {
    /// Get an alert by id. `Ok(None)` when it does not exist.
    async fn get_alert(&self, alert_id: &str) -> anyhow::Result<Option<AlertRecord>>;

    /// Append delivery records to an alert and return its updated summary.
    async fn update_delivery(&self, alert_id: &str, records: Vec<DeliveryRecord>) -> anyhow::Result<AlertSummary>;
}

#[async_trait]
pub trait AnalysisStore: Send + Sync + 'static {
    /// Get analysis metadata. `version = None` means the latest one.
    async fn get_analysis(&self, analysis_id: &str, version: Option<&str>) -> anyhow::Result<Option<AnalysisRecord>>;
}

/// --------------------
/// In-memory implementations (good for fast tests / dev)
/// --------------------
pub struct InMemoryAlertStore {
    items: Arc<RwLock<HashMap<String, AlertRecord>>>,
}

impl InMemoryAlertStore {
    pub fn new(initial: Vec<AlertRecord>) -> Self {
        let items = initial.into_iter().map(|a| (a.alert_id.clone(), a)).collect();
        Self { items: Arc::new(RwLock::new(items)) }
    }

    pub async fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read alerts file {:?}", path))?;
        let records: Vec<AlertRecord> =
            serde_yaml::from_str(&raw).with_context(|| format!("invalid alerts file {:?}", path))?;
        Ok(Self::new(records))
    }

    pub async fn insert(&self, record: AlertRecord) {
        self.items.write().await.insert(record.alert_id.clone(), record);
    }
}

#[async_trait]
impl AlertStore for InMemoryAlertStore {
    async fn get_alert(&self, alert_id: &str) -> anyhow::Result<Option<AlertRecord>> {
        Ok(self.items.read().await.get(alert_id).cloned())
    }

    async fn update_delivery(&self, alert_id: &str, records: Vec<DeliveryRecord>) -> anyhow::Result<AlertSummary> {
        let mut items = self.items.write().await;
        let record = items
            .get_mut(alert_id)
            .ok_or_else(|| anyhow::anyhow!("alert {} not found", alert_id))?;
        record.delivery_responses.extend(records);
        record.updated_at = Some(Utc::now());
        metrics::increment_counter!(ALERT_STORE_DELIVERY_UPDATES);
        Ok(record.summary())
    }
}

pub struct InMemoryAnalysisStore {
    // key: analysis id -> versions, last one is the latest
    items: Arc<RwLock<HashMap<String, Vec<AnalysisRecord>>>>,
}

impl InMemoryAnalysisStore {
    pub fn new(initial: Vec<AnalysisRecord>) -> Self {
        let mut items: HashMap<String, Vec<AnalysisRecord>> = HashMap::new();
        for record in initial {
            items.entry(record.id.clone()).or_default().push(record);
        }
        Self { items: Arc::new(RwLock::new(items)) }
    }

    pub async fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read analyses file {:?}", path))?;
        let records: Vec<AnalysisRecord> =
            serde_yaml::from_str(&raw).with_context(|| format!("invalid analyses file {:?}", path))?;
        Ok(Self::new(records))
    }

    pub async fn remove(&self, analysis_id: &str) {
        self.items.write().await.remove(analysis_id);
    }
}

#[async_trait]
impl AnalysisStore for InMemoryAnalysisStore {
    async fn get_analysis(&self, analysis_id: &str, version: Option<&str>) -> anyhow::Result<Option<AnalysisRecord>> {
        let items = self.items.read().await;
        let Some(versions) = items.get(analysis_id) else {
            return Ok(None);
        };
        let found = match version {
            Some(v) => versions.iter().find(|a| a.version.as_deref() == Some(v)),
            None => versions.last(),
        };
        Ok(found.cloned())
    }
}
