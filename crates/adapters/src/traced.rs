// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use crate::store::{Batch, Reply, Store, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tracing::Instrument;

/// Wrapper that adds tracing to any Store
#[derive(Clone)]
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: Store> Store for TracedStore<S> {
    async fn lpop(&self, key: &str) -> Result<Option<String>, StoreError> {
        let result = self.inner.lpop(key).await;
        tracing::trace!(key, popped = ?result.as_ref().ok(), "lpop");
        result
    }

    async fn blpop(
        &self,
        key: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<String>, StoreError> {
        let span = tracing::debug_span!("store.blpop", key, timeout = ?timeout);
        async {
            tracing::debug!("waiting");

            let start = std::time::Instant::now();
            let result = self.inner.blpop(key, timeout).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(Some(value)) => tracing::debug!(
                    value,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "popped"
                ),
                Ok(None) => tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "timed out"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "blpop failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn llen(&self, key: &str) -> Result<usize, StoreError> {
        let result = self.inner.llen(key).await;
        tracing::trace!(key, len = ?result.as_ref().ok(), "llen");
        result
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<bool, StoreError> {
        let result = self.inner.hset(key, field, value).await;
        if let Err(e) = &result {
            tracing::error!(key, field, error = %e, "hset failed");
        }
        result
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        let result = self.inner.hexists(key, field).await;
        tracing::trace!(key, field, exists = ?result.as_ref().ok(), "hexists");
        result
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let result = self.inner.hgetall(key).await;
        tracing::trace!(key, fields = result.as_ref().map(|h| h.len()).ok(), "hgetall");
        result
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let result = self.inner.get(key).await;
        tracing::trace!(key, found = result.as_ref().map(|v| v.is_some()).ok(), "get");
        result
    }

    async fn set_nx(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let result = self.inner.set_nx(key, value).await;
        match &result {
            Ok(set) => tracing::debug!(key, set, "set_nx"),
            Err(e) => tracing::error!(key, error = %e, "set_nx failed"),
        }
        result
    }

    async fn getset(&self, key: &str, value: &str) -> Result<Option<String>, StoreError> {
        let result = self.inner.getset(key, value).await;
        match &result {
            Ok(previous) => tracing::debug!(key, previous = ?previous, "getset"),
            Err(e) => tracing::error!(key, error = %e, "getset failed"),
        }
        result
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let result = self.inner.exists(key).await;
        tracing::trace!(key, exists = ?result.as_ref().ok(), "exists");
        result
    }

    async fn del(&self, keys: &[String]) -> Result<usize, StoreError> {
        let span = tracing::info_span!("store.del", count = keys.len());
        async {
            let result = self.inner.del(keys).await;
            match &result {
                Ok(removed) => tracing::info!(removed, "deleted"),
                Err(e) => tracing::error!(error = %e, "del failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn exec(&self, batch: Batch) -> Result<Option<Vec<Reply>>, StoreError> {
        let span = tracing::debug_span!(
            "store.exec",
            commands = batch.len(),
            guarded = batch.guard.is_some()
        );
        async {
            let start = std::time::Instant::now();
            let result = self.inner.exec(batch).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(Some(_)) => tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "applied"),
                Ok(None) => tracing::debug!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "guard failed, batch discarded"
                ),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "exec failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn time(&self) -> Result<DateTime<Utc>, StoreError> {
        let result = self.inner.time().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "time failed");
        }
        result
    }

    async fn dbsize(&self) -> Result<usize, StoreError> {
        self.inner.dbsize().await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
