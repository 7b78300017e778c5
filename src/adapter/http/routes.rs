use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::adapter::http::{controller::HttpController, middleware::request_log};

/// Construye el router HTTP con rutas, middlewares y controladores
pub fn build_router(controller: Arc<HttpController>) -> Router {
    Router::new()
        .route("/alerts/deliver", post(HttpController::deliver_alert))
        .route("/alerts/queue", post(HttpController::queue_alerts))
        .route("/outputs/test", post(HttpController::send_test_alert))
        .route("/healthz", get(HttpController::health))
        .layer(from_fn(request_log))
        .with_state(controller)
}
