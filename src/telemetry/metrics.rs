// src/telemetry/metrics.rs
//! Metric names and descriptions for alert-delivery-service.
//!
//! Counters are emitted through the `metrics` facade where the events happen.
//! No exporter is installed here: the host process installs a recorder, otherwise
//! every update is a no-op.
//!
//! Labels are kept low-cardinality: output type, a retryable flag, a drop reason.

use metrics::{describe_counter, Unit};

pub const DISPATCHED_TOTAL: &str = "alert_delivery_dispatched_total";
pub const SUCCEEDED_TOTAL: &str = "alert_delivery_succeeded_total";
pub const FAILED_TOTAL: &str = "alert_delivery_failed_total";
pub const RETRIES_ENQUEUED_TOTAL: &str = "alert_delivery_retries_enqueued_total";
pub const RETRIES_DROPPED_TOTAL: &str = "alert_delivery_retries_dropped_total";
pub const OUTPUTS_CACHE_REFRESH_TOTAL: &str = "alert_delivery_outputs_cache_refresh_total";
pub const WORK_QUEUE_ENQUEUED_TOTAL: &str = "work_queue_enqueued_total";
pub const ALERT_STORE_DELIVERY_UPDATES: &str = "alert_store_delivery_updates";

/// Describe every counter once at start-up.
pub fn register_core_metrics() {
    describe_counter!(DISPATCHED_TOTAL, Unit::Count, "Delivery attempts started, by output_type");
    describe_counter!(SUCCEEDED_TOTAL, Unit::Count, "Delivery attempts that succeeded");
    describe_counter!(FAILED_TOTAL, Unit::Count, "Delivery attempts that failed, by retryable");
    describe_counter!(RETRIES_ENQUEUED_TOTAL, Unit::Count, "Single-output retries placed on the work queue");
    describe_counter!(RETRIES_DROPPED_TOTAL, Unit::Count, "Failed deliveries not retried, by reason");
    describe_counter!(OUTPUTS_CACHE_REFRESH_TOTAL, Unit::Count, "Output store fetches made by the outputs cache");
    describe_counter!(WORK_QUEUE_ENQUEUED_TOTAL, Unit::Count, "Messages accepted by the work queue");
    describe_counter!(ALERT_STORE_DELIVERY_UPDATES, Unit::Count, "Delivery history updates applied to stored alerts");
}
