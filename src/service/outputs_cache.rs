// src/service/outputs_cache.rs
//! Outputs cache
//!
//! Responsibilities:
//! - Keep the last fetched output list for `refresh_interval`, sparing the output store
//!   a call on every dispatch.
//! - On a miss (empty or expired) fetch the full list, with secrets, and swap it in as a unit.
//! - Leave the cached value untouched when the store fails.
//! - `invalidate()` forces the next `get()` to refetch (interactive deliveries use it).
//!
//! The fetch runs without holding the lock, so two concurrent misses may both fetch.
//! The result is a redundant fetch, never a torn list: readers always see a whole `Arc<Vec<Output>>`.

use std::{sync::Arc, time::Duration};
use tokio::{sync::RwLock, time::Instant};
use tracing::{debug, info};

use crate::domain::model::output::Output;
use crate::repository::output_store::OutputStore;
use crate::telemetry::metrics::OUTPUTS_CACHE_REFRESH_TOTAL;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

struct CachedOutputs {
    outputs: Arc<Vec<Output>>,
    fetched_at: Instant,
}

pub struct OutputsCache {
    store: Arc<dyn OutputStore>,
    refresh_interval: Duration,
    inner: RwLock<Option<CachedOutputs>>,
}

impl OutputsCache {
    pub fn new(store: Arc<dyn OutputStore>, refresh_interval: Duration) -> Self {
        Self {
            store,
            refresh_interval,
            inner: RwLock::new(None),
        }
    }

    /// Current output list, fetching it if the cache is empty or expired.
    pub async fn get(&self) -> anyhow::Result<Arc<Vec<Output>>> {
        {
            let guard = self.inner.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.fetched_at.elapsed() <= self.refresh_interval {
                    return Ok(Arc::clone(&cached.outputs));
                }
                debug!("outputs cache expired");
            }
        }

        let outputs = Arc::new(self.store.fetch_outputs().await?);
        info!(count = outputs.len(), "refreshed outputs cache");
        metrics::increment_counter!(OUTPUTS_CACHE_REFRESH_TOTAL);

        let mut guard = self.inner.write().await;
        *guard = Some(CachedOutputs {
            outputs: Arc::clone(&outputs),
            fetched_at: Instant::now(),
        });
        Ok(outputs)
    }

    /// Drop the cached list; the next `get()` refetches.
    pub async fn invalidate(&self) {
        *self.inner.write().await = None;
    }
}
