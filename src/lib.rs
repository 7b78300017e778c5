// src/lib.rs
//! Núcleo de entrega de alertas `alert-delivery-service`.
//!
//! Flujo por alerta: resolución de outputs (caché + severidad/overrides), despacho
//! concurrente a cada canal, registro del estado de entrega y reintentos vía work queue.

pub mod adapter {
    #[cfg(feature = "http")]
    pub mod http {
        pub mod controller;
        pub mod middleware;
        pub mod routes;
    }
    pub mod notifier {
        pub mod alert_message;
        pub mod http_client;
        pub mod msteams_notifier;
        pub mod notifier_registry;
        pub mod opsgenie_notifier;
        pub mod pagerduty_notifier;
        pub mod slack_notifier;
        pub mod webhook_notifier;
    }
}

pub mod config {
    pub mod app_config;
}

pub mod domain {
    pub mod error;
    pub mod model {
        pub mod alert;
        pub mod delivery_status;
        pub mod output;
        pub mod severity;
    }
}

pub mod repository {
    pub mod alert_store;
    pub mod output_store;
    pub mod work_queue;
}

pub mod scheduler {
    pub mod queue_poller;
    pub mod retry_scheduler;
}

pub mod service {
    pub mod notification_dispatcher;
    pub mod output_resolver;
    pub mod outputs_cache;
    pub mod status_recorder;
}

pub mod telemetry {
    pub mod metrics;
    pub mod tracing;
}

pub mod usecase {
    pub mod alert_delivery;
    pub mod deliver_alert;
    pub mod dispatch_alerts;
    pub mod send_test_alert;
}
