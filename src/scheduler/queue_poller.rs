// src/scheduler/queue_poller.rs
//! Queue poller
//!
//! Background worker feeding the batch entry point:
//! - On every tick, drain ready messages from the work queue in batches of `batch_size`.
//! - Hand each batch to `AlertDeliveryService::dispatch_alerts`.
//! - If the whole batch fails with a retryable error, put the raw messages back with
//!   `requeue_delay` so nothing read from the queue is lost.
//!
//! Usage pattern:
//! - `Arc::new(QueuePoller::new(..)).start()` returns a `QueuePollerHandle`.
//! - `handle.shutdown().await` stops the loop after the batch in progress.

use anyhow::Context;
use std::{sync::Arc, time::Duration};
use tokio::{sync::mpsc, task::JoinHandle, time};
use tracing::{error, info, warn};

use crate::domain::error::DeliveryError;
use crate::repository::work_queue::{InMemoryWorkQueue, QueueEntry, QueueMessage, WorkQueue};
use crate::usecase::alert_delivery::AlertDeliveryService;
use crate::usecase::dispatch_alerts::DispatchSummary;

#[derive(Debug, Clone)]
pub struct QueuePollerConfig {
    pub poll_interval: Duration,
    pub batch_size: usize,
    /// Delay for messages put back after a failed batch.
    pub requeue_delay: Duration,
}

impl Default for QueuePollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            batch_size: 10,
            requeue_delay: Duration::from_secs(10),
        }
    }
}

pub struct QueuePollerHandle {
    shutdown_tx: mpsc::Sender<()>,
    join_handle: JoinHandle<()>,
}

impl QueuePollerHandle {
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let _ = self.shutdown_tx.send(()).await;
        self.join_handle.await.context("queue poller join failed")?;
        Ok(())
    }
}

pub struct QueuePoller {
    queue: Arc<InMemoryWorkQueue>,
    service: Arc<AlertDeliveryService>,
    config: QueuePollerConfig,
}

impl QueuePoller {
    pub fn new(queue: Arc<InMemoryWorkQueue>, service: Arc<AlertDeliveryService>, config: QueuePollerConfig) -> Self {
        Self { queue, service, config }
    }

    pub fn start(self: Arc<Self>) -> QueuePollerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        let poller = Arc::clone(&self);
        let join_handle = tokio::spawn(async move {
            info!(
                poll_interval_ms = poller.config.poll_interval.as_millis() as u64,
                batch_size = poller.config.batch_size,
                "queue poller started"
            );
            let mut ticker = time::interval(poller.config.poll_interval);
            ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        poller.drain().await;
                    },
                    _ = shutdown_rx.recv() => {
                        info!("queue poller shutdown requested");
                        break;
                    }
                }
            }
            info!("queue poller exiting");
        });

        QueuePollerHandle { shutdown_tx, join_handle }
    }

    /// Process full batches until the queue has nothing ready or a batch fails.
    pub async fn drain(&self) -> usize {
        let mut processed = 0;
        loop {
            let received = self.run_once().await;
            processed += received;
            if received < self.config.batch_size {
                break;
            }
        }
        processed
    }

    /// Receive one batch and dispatch it. Returns the number of messages received,
    /// or 0 when the batch failed and was put back.
    pub async fn run_once(&self) -> usize {
        let messages = self.queue.receive_ready(self.config.batch_size).await;
        if messages.is_empty() {
            return 0;
        }

        match self.service.dispatch_alerts(&messages).await {
            Ok(DispatchSummary { received, .. }) => received,
            Err(e) => self.settle_failed_batch(messages, &e).await,
        }
    }

    /// Retryable failures put the batch back and count as nothing processed.
    /// Anything else may have delivered already, so the batch is dropped.
    async fn settle_failed_batch(&self, messages: Vec<QueueMessage>, err: &DeliveryError) -> usize {
        if err.is_retryable() {
            warn!(count = messages.len(), error = %err, "batch failed, putting messages back");
            self.requeue(messages).await;
            return 0;
        }
        error!(count = messages.len(), error = %err, "batch rejected, dropping messages");
        messages.len()
    }

    async fn requeue(&self, messages: Vec<QueueMessage>) {
        let entries = messages
            .into_iter()
            .map(|m| QueueEntry { id: m.message_id, body: m.body, delay: self.config.requeue_delay })
            .collect();
        if let Err(e) = self.queue.send_batch(entries).await {
            error!(error = %e, "failed to put messages back on the queue");
        }
    }
}
