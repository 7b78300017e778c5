// src/telemetry/tracing.rs
//! Logging setup for alert-delivery-service.
//!
//! - `RUST_LOG` wins over the configured level when set.
//! - JSON output for production log pipelines, compact text otherwise.
//! - Safe to call more than once: later calls are no-ops (tests, embedded use).

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

use crate::config::app_config::LoggingConfig;

pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if config.json {
        Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init()
    } else {
        Registry::default()
            .with(filter)
            .with(fmt::layer().compact().with_target(true))
            .try_init()
    };

    if result.is_ok() {
        info!(level = %config.level, json = config.json, "tracing initialized");
    }
}
