// adapter/notifier/alert_message.rs

use crate::domain::model::alert::Alert;

/// Texto común de una alerta, compartido por los canales de chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub title: String,
    pub body: String,
}

impl AlertMessage {
    pub fn from_alert(alert: &Alert) -> Self {
        let prefix = if alert.is_test { "[Test] " } else { "" };
        let title = if alert.title.is_empty() {
            format!("{}{}", prefix, alert.analysis_display_name())
        } else {
            format!("{}{}", prefix, alert.title)
        };

        let mut lines = vec![
            format!("Severity: {}", alert.severity),
            format!("Analysis: {}", alert.analysis_display_name()),
        ];
        if !alert.analysis_description.is_empty() {
            lines.push(format!("Description: {}", alert.analysis_description));
        }
        if !alert.runbook.is_empty() {
            lines.push(format!("Runbook: {}", alert.runbook));
        }
        if !alert.tags.is_empty() {
            lines.push(format!("Tags: {}", alert.tags.join(", ")));
        }
        if alert.is_resent {
            lines.push("(re-sent)".to_string());
        }

        Self { title, body: lines.join("\n") }
    }

    /// Título y cuerpo en un solo bloque.
    pub fn full_text(&self) -> String {
        format!("{}\n{}", self.title, self.body)
    }
}
