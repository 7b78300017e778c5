// src/repository/output_store.rs
//! Output store: read-only access to every configured output, secrets included.
//!
//! - `OutputStore` trait: the single call the delivery core needs.
//! - `InMemoryOutputStore`: fixed list plus a fetch counter, for tests/dev.
//! - `FileOutputStore`: YAML/JSON file re-read on every fetch, so edits show up
//!   as soon as the outputs cache expires.

use async_trait::async_trait;
use anyhow::Context;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::model::output::Output;

#[async_trait]
pub trait OutputStore: Send + Sync + 'static {
    /// Fetch all outputs including their decrypted channel configuration.
    async fn fetch_outputs(&self) -> anyhow::Result<Vec<Output>>;
}

/// --------------------
/// In-memory implementation
/// --------------------
pub struct InMemoryOutputStore {
    outputs: RwLock<Vec<Output>>,
    fetches: AtomicUsize,
    fail: RwLock<Option<String>>,
}

impl InMemoryOutputStore {
    pub fn new(outputs: Vec<Output>) -> Self {
        Self {
            outputs: RwLock::new(outputs),
            fetches: AtomicUsize::new(0),
            fail: RwLock::new(None),
        }
    }

    /// Number of `fetch_outputs` calls served (including failed ones).
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub async fn replace(&self, outputs: Vec<Output>) {
        *self.outputs.write().await = outputs;
    }

    /// Make subsequent fetches fail with `reason` (`None` restores normal behaviour).
    pub async fn set_failure(&self, reason: Option<String>) {
        *self.fail.write().await = reason;
    }
}

#[async_trait]
impl OutputStore for InMemoryOutputStore {
    async fn fetch_outputs(&self) -> anyhow::Result<Vec<Output>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.fail.read().await.clone() {
            anyhow::bail!(reason);
        }
        Ok(self.outputs.read().await.clone())
    }
}

/// --------------------
/// File-backed implementation
/// --------------------
pub struct FileOutputStore {
    path: PathBuf,
}

impl FileOutputStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(path: &PathBuf, raw: &str) -> anyhow::Result<Vec<Output>> {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("JSON parse error: {}", e))
        } else {
            serde_yaml::from_str(raw).map_err(|e| anyhow::anyhow!("YAML parse error: {}", e))
        }
    }
}

#[async_trait]
impl OutputStore for FileOutputStore {
    async fn fetch_outputs(&self) -> anyhow::Result<Vec<Output>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read outputs file {:?}", self.path))?;
        let outputs = Self::parse(&self.path, &raw)
            .with_context(|| format!("invalid outputs file {:?}", self.path))?;
        debug!(count = outputs.len(), path = ?self.path, "loaded outputs from file");
        Ok(outputs)
    }
}
