// src/repository/work_queue.rs
//! Work queue: the queue that triggers batch dispatch and receives retries.
//!
//! Responsibilities:
//! - Accept serialized alerts with a per-message delay.
//! - Release messages only once their delay has elapsed (earliest first).
//! - Reject delays above the queue maximum.
//!
//! This file provides:
//! - `QueueEntry` (what producers send) and `QueueMessage` (what consumers receive).
//! - `WorkQueue` trait describing the producer side.
//! - `InMemoryWorkQueue`, a delay queue backed by a min-heap, suitable for tests/dev.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    time::Duration,
};
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use crate::telemetry::metrics::WORK_QUEUE_ENQUEUED_TOTAL;

/// Upper bound for a single message delay, in seconds.
pub const MAX_QUEUE_DELAY_SECS: u64 = 900;

/// Message to enqueue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: String,
    pub body: String,
    pub delay: Duration,
}

impl QueueEntry {
    pub fn new(body: String, delay: Duration) -> Self {
        Self { id: Uuid::new_v4().to_string(), body, delay }
    }
}

/// Message delivered to the batch consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessage {
    pub message_id: String,
    pub body: String,
}

#[async_trait]
pub trait WorkQueue: Send + Sync + 'static {
    /// Enqueue a batch. The whole call fails if any entry is rejected.
    async fn send_batch(&self, entries: Vec<QueueEntry>) -> anyhow::Result<()>;
}

/// Internal heap item: min-heap by ready time, then by insertion order.
#[derive(Debug)]
struct HeapItem {
    ready_at: Instant,
    seq: u64,
    message: QueueMessage,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.ready_at == other.ready_at && self.seq == other.seq
    }
}
impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed for BinaryHeap (max-heap) -> earliest ready_at on top
        other
            .ready_at
            .cmp(&self.ready_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct QueueState {
    heap: BinaryHeap<HeapItem>,
    next_seq: u64,
}

/// --------------------
/// In-memory implementation
/// --------------------
#[derive(Default)]
pub struct InMemoryWorkQueue {
    state: Mutex<QueueState>,
}

impl InMemoryWorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop up to `limit` messages whose delay has elapsed, earliest first.
    pub async fn receive_ready(&self, limit: usize) -> Vec<QueueMessage> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        let mut out = Vec::new();
        while out.len() < limit {
            match state.heap.peek() {
                Some(top) if top.ready_at <= now => {
                    if let Some(item) = state.heap.pop() {
                        out.push(item.message);
                    }
                }
                _ => break,
            }
        }
        out
    }

    /// Total messages held, ready or not.
    pub async fn len(&self) -> usize {
        self.state.lock().await.heap.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl WorkQueue for InMemoryWorkQueue {
    async fn send_batch(&self, entries: Vec<QueueEntry>) -> anyhow::Result<()> {
        if let Some(bad) = entries.iter().find(|e| e.delay.as_secs() > MAX_QUEUE_DELAY_SECS) {
            anyhow::bail!(
                "delay of {}s for message {} exceeds the queue maximum of {}s",
                bad.delay.as_secs(),
                bad.id,
                MAX_QUEUE_DELAY_SECS
            );
        }

        let now = Instant::now();
        let count = entries.len() as u64;
        let mut state = self.state.lock().await;
        for entry in entries {
            let seq = state.next_seq;
            state.next_seq += 1;
            state.heap.push(HeapItem {
                ready_at: now + entry.delay,
                seq,
                message: QueueMessage { message_id: entry.id, body: entry.body },
            });
        }
        metrics::counter!(WORK_QUEUE_ENQUEUED_TOTAL, count);
        Ok(())
    }
}
