use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::domain::error::DeliveryError;
use crate::domain::model::alert::Alert;
use crate::repository::work_queue::{InMemoryWorkQueue, QueueEntry, WorkQueue};
use crate::usecase::alert_delivery::AlertDeliveryService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverAlertRequest {
    pub alert_id: String,
    #[serde(default)]
    pub output_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestAlertRequest {
    #[serde(default)]
    pub output_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct QueuedAlerts {
    pub enqueued: usize,
}

// Respuesta genérica con posible error
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    message: Option<String>,
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Response {
        (StatusCode::OK, Json(ApiResponse { success: true, message: None, data: Some(data) })).into_response()
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body: ApiResponse<()> = ApiResponse { success: false, message: Some(message.into()), data: None };
    (status, Json(body)).into_response()
}

impl IntoResponse for DeliveryError {
    fn into_response(self) -> Response {
        let status = match &self {
            DeliveryError::NotFound { .. } => StatusCode::NOT_FOUND,
            DeliveryError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            DeliveryError::Internal { .. } | DeliveryError::Fatal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error_response(status, self.to_string())
    }
}

pub struct HttpController {
    service: Arc<AlertDeliveryService>,
    queue: Arc<InMemoryWorkQueue>,
}

impl HttpController {
    pub fn new(service: Arc<AlertDeliveryService>, queue: Arc<InMemoryWorkQueue>) -> Self {
        Self { service, queue }
    }

    /// POST /alerts/deliver
    pub async fn deliver_alert(
        State(ctrl): State<Arc<HttpController>>,
        Json(req): Json<DeliverAlertRequest>,
    ) -> Response {
        info!(alert_id = %req.alert_id, outputs = req.output_ids.len(), "deliver alert requested");
        match ctrl.service.deliver_alert(&req.alert_id, &req.output_ids).await {
            Ok(summaries) => ApiResponse::success(summaries),
            Err(e) => {
                warn!(alert_id = %req.alert_id, error = %e, "deliver alert failed");
                e.into_response()
            }
        }
    }

    /// POST /outputs/test
    pub async fn send_test_alert(
        State(ctrl): State<Arc<HttpController>>,
        Json(req): Json<TestAlertRequest>,
    ) -> Response {
        info!(outputs = req.output_ids.len(), "test alert requested");
        match ctrl.service.send_test_alert(&req.output_ids).await {
            Ok(records) => ApiResponse::success(records),
            Err(e) => {
                warn!(error = %e, "test alert failed");
                e.into_response()
            }
        }
    }

    /// POST /alerts/queue: validar y encolar sin retardo para el batch path.
    pub async fn queue_alerts(
        State(ctrl): State<Arc<HttpController>>,
        Json(alerts): Json<Vec<Alert>>,
    ) -> Response {
        for (idx, alert) in alerts.iter().enumerate() {
            if let Err(reason) = alert.validate() {
                return error_response(StatusCode::BAD_REQUEST, format!("alert #{}: {}", idx, reason));
            }
        }

        let mut entries = Vec::with_capacity(alerts.len());
        for alert in &alerts {
            match alert.to_json() {
                Ok(body) => entries.push(QueueEntry::new(body, Duration::ZERO)),
                Err(e) => {
                    error!(error = %e, "failed to serialize alert");
                    return DeliveryError::internal("failed to serialize alert").into_response();
                }
            }
        }

        let enqueued = entries.len();
        if let Err(e) = ctrl.queue.send_batch(entries).await {
            error!(error = %e, "failed to enqueue alerts");
            return DeliveryError::internal("failed to enqueue alerts").into_response();
        }
        info!(enqueued, "alerts queued for dispatch");
        ApiResponse::success(QueuedAlerts { enqueued })
    }

    /// GET /healthz
    pub async fn health() -> Response {
        ApiResponse::success("ok")
    }
}
