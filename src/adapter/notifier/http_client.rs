// adapter/notifier/http_client.rs

use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::model::delivery_status::DeliveryResponse;

/// Máximo de bytes del cuerpo de respuesta que se guardan en el mensaje de estado.
const MAX_BODY_IN_MESSAGE: usize = 512;

/// Cliente HTTP compartido por todos los notifiers (un único pool de conexiones).
#[derive(Clone)]
pub struct HttpDelivery {
    client: Client,
}

impl HttpDelivery {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("alert-delivery-service/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// POST JSON y clasificación de la respuesta. Nunca devuelve error:
    /// los fallos de transporte se traducen a un `DeliveryResponse` transitorio.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        headers: &[(&str, String)],
    ) -> DeliveryResponse {
        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        match request.send().await {
            Ok(resp) => {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                debug!(status = status.as_u16(), "channel responded");
                classify(status, &text)
            }
            Err(e) => transport_failure(e),
        }
    }
}

/// 2xx éxito; 429 y 5xx transitorio; cualquier otro código es permanente.
pub fn classify(status: StatusCode, body: &str) -> DeliveryResponse {
    let code = status.as_u16();
    let message = truncate(body);
    if status.is_success() {
        DeliveryResponse::ok(code, message)
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        DeliveryResponse::transient(code, message)
    } else {
        DeliveryResponse::permanent(code, message)
    }
}

fn transport_failure(err: reqwest::Error) -> DeliveryResponse {
    // sin URL en el mensaje: puede llevar el token del webhook
    let err = err.without_url();
    if err.is_timeout() {
        warn!("channel request timed out");
        DeliveryResponse::transient(StatusCode::GATEWAY_TIMEOUT.as_u16(), "request timed out")
    } else {
        warn!(error = %err, "channel request failed");
        DeliveryResponse::transient(StatusCode::BAD_GATEWAY.as_u16(), format!("request failed: {}", err))
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_BODY_IN_MESSAGE {
        return body.to_string();
    }
    let mut end = MAX_BODY_IN_MESSAGE;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
