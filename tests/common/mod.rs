// tests/common/mod.rs
// Test doubles shared by the unit and integration test targets.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alert_delivery_service::adapter::notifier::notifier_registry::{Notifier, NotifierError, NotifierRegistry};
use alert_delivery_service::domain::model::alert::{Alert, AlertType};
use alert_delivery_service::domain::model::delivery_status::DeliveryResponse;
use alert_delivery_service::domain::model::output::{Output, OutputConfig, OutputKind};
use alert_delivery_service::domain::model::severity::Severity;
use alert_delivery_service::repository::alert_store::{AlertRecord, AnalysisRecord, InMemoryAlertStore, InMemoryAnalysisStore};
use alert_delivery_service::repository::output_store::InMemoryOutputStore;
use alert_delivery_service::repository::work_queue::{InMemoryWorkQueue, QueueEntry, QueueMessage, WorkQueue};
use alert_delivery_service::scheduler::retry_scheduler::{RetryPolicy, RetryScheduler};
use alert_delivery_service::service::notification_dispatcher::NotificationDispatcher;
use alert_delivery_service::service::outputs_cache::{OutputsCache, DEFAULT_REFRESH_INTERVAL};
use alert_delivery_service::service::status_recorder::StatusRecorder;
use alert_delivery_service::usecase::alert_delivery::AlertDeliveryService;

/// How the scripted notifier answers for a given webhook URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Ok,
    Transient,
    Permanent,
    Error,
    Panic,
}

/// Custom-webhook notifier that answers from a script keyed by webhook URL
/// and records every alert it receives.
pub struct ScriptedNotifier {
    script: HashMap<String, Behavior>,
    calls: Mutex<Vec<(String, Alert)>>,
}

impl ScriptedNotifier {
    pub fn new(script: &[(&str, Behavior)]) -> Self {
        Self {
            script: script.iter().map(|(url, b)| (url.to_string(), *b)).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Alert)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for ScriptedNotifier {
    fn kind(&self) -> OutputKind {
        OutputKind::CustomWebhook
    }

    async fn notify(&self, alert: &Alert, config: &OutputConfig) -> Result<DeliveryResponse, NotifierError> {
        let OutputConfig::CustomWebhook { webhook_url } = config else {
            return Err(NotifierError::ConfigMismatch { notifier: self.kind(), received: config.kind() });
        };
        self.calls.lock().unwrap().push((webhook_url.clone(), alert.clone()));

        match self.script.get(webhook_url).copied().unwrap_or(Behavior::Ok) {
            Behavior::Ok => Ok(DeliveryResponse::ok(200, "ok")),
            Behavior::Transient => Ok(DeliveryResponse::transient(500, "upstream unavailable")),
            Behavior::Permanent => Ok(DeliveryResponse::permanent(400, "invalid payload")),
            Behavior::Error => Err(NotifierError::Internal("template failure".into())),
            Behavior::Panic => panic!("notifier crashed"),
        }
    }
}

/// Queue that rejects every batch and counts the attempts.
#[derive(Default)]
pub struct FailingQueue {
    pub attempts: Mutex<usize>,
}

#[async_trait]
impl WorkQueue for FailingQueue {
    async fn send_batch(&self, _entries: Vec<QueueEntry>) -> anyhow::Result<()> {
        *self.attempts.lock().unwrap() += 1;
        anyhow::bail!("queue unavailable")
    }
}

/// Queue that keeps every batch as sent.
#[derive(Default)]
pub struct CapturingQueue {
    pub batches: Mutex<Vec<Vec<QueueEntry>>>,
}

impl CapturingQueue {
    pub fn entries(&self) -> Vec<QueueEntry> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.entries().iter().map(|e| Alert::from_json(&e.body).unwrap()).collect()
    }
}

#[async_trait]
impl WorkQueue for CapturingQueue {
    async fn send_batch(&self, entries: Vec<QueueEntry>) -> anyhow::Result<()> {
        self.batches.lock().unwrap().push(entries);
        Ok(())
    }
}

/// Custom webhook output whose URL equals its id, so scripts can key on the id.
pub fn webhook_output(id: &str, defaults: &[Severity]) -> Output {
    Output {
        output_id: id.into(),
        display_name: format!("{id} display"),
        default_for_severity: defaults.to_vec(),
        config: OutputConfig::CustomWebhook { webhook_url: id.into() },
    }
}

pub fn rule_alert(id: &str, severity: Severity, overrides: &[&str]) -> Alert {
    Alert {
        alert_id: Some(id.into()),
        analysis_id: "AWS.CloudTrail.RootActivity".into(),
        analysis_name: Some("AWS root account activity".into()),
        analysis_description: "Root account used".into(),
        alert_type: AlertType::Rule,
        created_at: Utc::now(),
        severity,
        title: format!("alert {id}"),
        runbook: String::new(),
        tags: vec!["aws".into()],
        version: Some("3".into()),
        output_ids: overrides.iter().map(|s| s.to_string()).collect(),
        retry_count: 0,
        is_test: false,
        is_resent: false,
        context: serde_json::Value::Null,
    }
}

pub fn alert_record(id: &str, severity: Severity) -> AlertRecord {
    AlertRecord {
        alert_id: id.into(),
        analysis_id: "AWS.CloudTrail.RootActivity".into(),
        analysis_version: Some("3".into()),
        alert_type: AlertType::Rule,
        title: format!("stored alert {id}"),
        severity,
        created_at: Utc::now(),
        context: serde_json::json!({"sourceIp": "203.0.113.7"}),
        delivery_responses: vec![],
        updated_at: None,
    }
}

pub fn analysis_record() -> AnalysisRecord {
    AnalysisRecord {
        id: "AWS.CloudTrail.RootActivity".into(),
        version: Some("3".into()),
        display_name: "AWS root account activity".into(),
        description: "The root account was used".into(),
        runbook: "Rotate root credentials".into(),
        tags: vec!["aws".into(), "identity".into()],
    }
}

pub fn message(alert: &Alert) -> QueueMessage {
    QueueMessage { message_id: uuid::Uuid::new_v4().to_string(), body: alert.to_json().unwrap() }
}

pub fn raw_message(body: &str) -> QueueMessage {
    QueueMessage { message_id: uuid::Uuid::new_v4().to_string(), body: body.to_string() }
}

/// Service wired with in-memory collaborators and a scripted notifier.
pub struct Harness {
    pub service: Arc<AlertDeliveryService>,
    pub queue: Arc<InMemoryWorkQueue>,
    pub outputs: Arc<InMemoryOutputStore>,
    pub alerts: Arc<InMemoryAlertStore>,
    pub analyses: Arc<InMemoryAnalysisStore>,
    pub notifier: Arc<ScriptedNotifier>,
}

impl Harness {
    pub fn new(outputs: Vec<Output>, script: &[(&str, Behavior)], policy: RetryPolicy) -> Self {
        let queue = Arc::new(InMemoryWorkQueue::new());
        let output_store = Arc::new(InMemoryOutputStore::new(outputs));
        let alerts = Arc::new(InMemoryAlertStore::new(vec![]));
        let analyses = Arc::new(InMemoryAnalysisStore::new(vec![analysis_record()]));
        let notifier = Arc::new(ScriptedNotifier::new(script));

        let mut registry = NotifierRegistry::new();
        registry.register(notifier.clone());

        let service = AlertDeliveryService::new(
            Arc::new(OutputsCache::new(output_store.clone(), DEFAULT_REFRESH_INTERVAL)),
            NotificationDispatcher::new(Arc::new(registry), None),
            StatusRecorder::new(alerts.clone()),
            RetryScheduler::new(queue.clone(), policy),
            alerts.clone(),
            analyses.clone(),
        );

        Self {
            service: Arc::new(service),
            queue,
            outputs: output_store,
            alerts,
            analyses,
            notifier,
        }
    }

    /// Everything in the work queue once all delays have elapsed. Needs a paused clock.
    pub async fn drain_queue(&self) -> Vec<Alert> {
        tokio::time::advance(std::time::Duration::from_secs(901)).await;
        self.queue
            .receive_ready(usize::MAX)
            .await
            .iter()
            .map(|m| Alert::from_json(&m.body).unwrap())
            .collect()
    }
}
