// src/domain/model/output.rs
//! Configured delivery channels ("outputs").
//!
//! The channel kind is never stored on its own: it is derived from the config
//! variant, so an output cannot claim to be Slack while carrying PagerDuty settings.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::model::severity::Severity;

/// Closed set of channel kinds. Used as the key of the notifier registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Slack,
    MsTeams,
    PagerDuty,
    Opsgenie,
    CustomWebhook,
    Sqs,
    Sns,
}

impl OutputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKind::Slack => "slack",
            OutputKind::MsTeams => "msteams",
            OutputKind::PagerDuty => "pagerduty",
            OutputKind::Opsgenie => "opsgenie",
            OutputKind::CustomWebhook => "customwebhook",
            OutputKind::Sqs => "sqs",
            OutputKind::Sns => "sns",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OpsgenieRegion {
    #[default]
    Us,
    Eu,
}

/// Kind-specific configuration, secrets included (URLs with tokens, API keys).
/// Never log these values.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outputType", content = "outputConfig", rename_all = "lowercase")]
pub enum OutputConfig {
    #[serde(rename_all = "camelCase")]
    Slack { webhook_url: String },
    #[serde(rename_all = "camelCase")]
    MsTeams { webhook_url: String },
    #[serde(rename_all = "camelCase")]
    PagerDuty { integration_key: String },
    #[serde(rename_all = "camelCase")]
    Opsgenie {
        api_key: String,
        #[serde(default)]
        service_region: OpsgenieRegion,
    },
    #[serde(rename_all = "camelCase")]
    CustomWebhook { webhook_url: String },
    #[serde(rename_all = "camelCase")]
    Sqs { queue_url: String },
    #[serde(rename_all = "camelCase")]
    Sns { topic_arn: String },
}

impl OutputConfig {
    pub fn kind(&self) -> OutputKind {
        match self {
            OutputConfig::Slack { .. } => OutputKind::Slack,
            OutputConfig::MsTeams { .. } => OutputKind::MsTeams,
            OutputConfig::PagerDuty { .. } => OutputKind::PagerDuty,
            OutputConfig::Opsgenie { .. } => OutputKind::Opsgenie,
            OutputConfig::CustomWebhook { .. } => OutputKind::CustomWebhook,
            OutputConfig::Sqs { .. } => OutputKind::Sqs,
            OutputConfig::Sns { .. } => OutputKind::Sns,
        }
    }
}

// Debug manual: solo el tipo, nunca los secretos.
impl fmt::Debug for OutputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputConfig({})", self.kind())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub output_id: String,
    #[serde(default)]
    pub display_name: String,
    /// Severities this output receives when an alert names no explicit destinations.
    #[serde(default)]
    pub default_for_severity: Vec<Severity>,
    #[serde(flatten)]
    pub config: OutputConfig,
}

impl Output {
    pub fn kind(&self) -> OutputKind {
        self.config.kind()
    }

    pub fn is_default_for(&self, severity: Severity) -> bool {
        self.default_for_severity.contains(&severity)
    }
}
