// src/scheduler/retry_scheduler.rs
//! Retry scheduler
//!
//! Responsibilities:
//! - Decide, per failed delivery status, whether the alert gets another attempt.
//! - Split multi-output failures into one single-output retry per failed output.
//! - Publish the retries on the work queue, each with its own random delay.
//!
//! Decision order for a failed status:
//! 1. `retry_count >= max_retry_count`: dropped, budget exhausted.
//! 2. `!needs_retry`: dropped, permanent failure.
//! 3. Otherwise: `alert.for_retry(output_id)` is enqueued.
//!
//! Serialization happens for the whole batch before anything is sent; a failure there
//! aborts the call. Queue sends go out in chunks and a failed chunk is logged and skipped.

use rand::Rng;
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};

use crate::domain::model::alert::Alert;
use crate::domain::model::delivery_status::DispatchStatus;
use crate::repository::work_queue::{QueueEntry, WorkQueue};
use crate::telemetry::metrics::{RETRIES_DROPPED_TOTAL, RETRIES_ENQUEUED_TOTAL};

/// Maximum entries per `send_batch` call.
pub const RETRY_CHUNK_SIZE: usize = 10;

/// Retry budget and delay window, fixed at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retry_count: u32,
    pub min_delay_secs: u64,
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retry_count: 10,
            min_delay_secs: 10,
            max_delay_secs: 30,
        }
    }
}

impl RetryPolicy {
    /// Uniform in `[min, max)`; `min` when the window is empty.
    pub fn random_delay(&self) -> Duration {
        let secs = if self.max_delay_secs > self.min_delay_secs {
            rand::thread_rng().gen_range(self.min_delay_secs..self.max_delay_secs)
        } else {
            self.min_delay_secs
        };
        Duration::from_secs(secs)
    }
}

/// Why a failed status was not retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    RetryBudgetExhausted,
    PermanentFailure,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::RetryBudgetExhausted => "retry_budget_exhausted",
            DropReason::PermanentFailure => "permanent_failure",
        }
    }
}

/// Retry decision for one status: `Ok(retry alert)` or the reason it was dropped.
/// Successful statuses yield `None`.
pub fn plan_retry(status: &DispatchStatus, max_retry_count: u32) -> Option<Result<Alert, DropReason>> {
    if status.success() {
        return None;
    }
    if status.alert.retry_count >= max_retry_count {
        return Some(Err(DropReason::RetryBudgetExhausted));
    }
    if !status.needs_retry() {
        return Some(Err(DropReason::PermanentFailure));
    }
    Some(Ok(status.alert.for_retry(&status.output_id)))
}

pub struct RetryScheduler {
    queue: Arc<dyn WorkQueue>,
    policy: RetryPolicy,
}

impl RetryScheduler {
    pub fn new(queue: Arc<dyn WorkQueue>, policy: RetryPolicy) -> Self {
        Self { queue, policy }
    }

    /// Enqueue retries for the retryable failures in `statuses`.
    /// Returns how many retries were handed to the queue.
    pub async fn schedule_retries(&self, statuses: &[DispatchStatus]) -> anyhow::Result<usize> {
        let mut retries = Vec::new();
        for status in statuses {
            match plan_retry(status, self.policy.max_retry_count) {
                None => {}
                Some(Ok(retry)) => retries.push(retry),
                Some(Err(reason)) => {
                    info!(
                        alert_id = status.alert.log_id(),
                        output_id = %status.output_id,
                        retry_count = status.alert.retry_count,
                        reason = reason.as_str(),
                        "not retrying failed delivery"
                    );
                    metrics::increment_counter!(RETRIES_DROPPED_TOTAL, "reason" => reason.as_str());
                }
            }
        }

        if retries.is_empty() {
            return Ok(0);
        }

        let mut entries = Vec::with_capacity(retries.len());
        for retry in &retries {
            let body = retry.to_json()?;
            entries.push(QueueEntry::new(body, self.policy.random_delay()));
        }

        let mut sent = 0;
        for chunk in entries.chunks(RETRY_CHUNK_SIZE) {
            match self.queue.send_batch(chunk.to_vec()).await {
                Ok(()) => {
                    sent += chunk.len();
                    debug!(count = chunk.len(), "retry chunk enqueued");
                }
                Err(e) => {
                    error!(count = chunk.len(), error = %e, "failed to enqueue retries, dropping chunk");
                }
            }
        }

        if sent < entries.len() {
            warn!(requested = entries.len(), sent, "some retries were lost");
        }
        metrics::counter!(RETRIES_ENQUEUED_TOTAL, sent as u64);
        Ok(sent)
    }
}
