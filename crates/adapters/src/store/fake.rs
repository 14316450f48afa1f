// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake store adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Batch, MemoryStore, Reply, Store, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use turnstile_core::clock::FakeClock;

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    LPop { key: String },
    BLPop { key: String, timeout: Option<Duration> },
    LLen { key: String },
    HSet { key: String, field: String },
    HExists { key: String, field: String },
    HGetAll { key: String },
    Get { key: String },
    SetNx { key: String },
    GetSet { key: String },
    Exists { key: String },
    Del { keys: Vec<String> },
    Exec { batch: Batch },
    Time,
    DbSize,
}

/// In-memory store that records calls and can simulate outages.
///
/// Clones share data, recorded calls and failure switches.
#[derive(Clone)]
pub struct FakeStore {
    inner: MemoryStore<FakeClock>,
    clock: FakeClock,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    offline: Arc<AtomicBool>,
    failing_execs: Arc<AtomicUsize>,
}

impl Default for FakeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeStore {
    pub fn new() -> Self {
        Self::with_clock(FakeClock::new())
    }

    pub fn with_clock(clock: FakeClock) -> Self {
        Self {
            inner: MemoryStore::with_clock(clock.clone()),
            clock,
            calls: Arc::new(Mutex::new(Vec::new())),
            offline: Arc::new(AtomicBool::new(false)),
            failing_execs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn clock(&self) -> &FakeClock {
        &self.clock
    }

    /// The backing store, bypassing call recording and failures
    pub fn memory(&self) -> &MemoryStore<FakeClock> {
        &self.inner
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Make every call fail with [`StoreError::Unavailable`]
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn go_online(&self) {
        self.offline.store(false, Ordering::SeqCst);
    }

    /// Fail the next `count` batch executions without applying them
    pub fn fail_next_execs(&self, count: usize) {
        self.failing_execs.store(count, Ordering::SeqCst);
    }

    fn record(&self, call: StoreCall) -> Result<(), StoreError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);

        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("fake store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn lpop(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.record(StoreCall::LPop {
            key: key.to_string(),
        })?;
        self.inner.lpop(key).await
    }

    async fn blpop(
        &self,
        key: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<String>, StoreError> {
        self.record(StoreCall::BLPop {
            key: key.to_string(),
            timeout,
        })?;
        self.inner.blpop(key, timeout).await
    }

    async fn llen(&self, key: &str) -> Result<usize, StoreError> {
        self.record(StoreCall::LLen {
            key: key.to_string(),
        })?;
        self.inner.llen(key).await
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<bool, StoreError> {
        self.record(StoreCall::HSet {
            key: key.to_string(),
            field: field.to_string(),
        })?;
        self.inner.hset(key, field, value).await
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        self.record(StoreCall::HExists {
            key: key.to_string(),
            field: field.to_string(),
        })?;
        self.inner.hexists(key, field).await
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        self.record(StoreCall::HGetAll {
            key: key.to_string(),
        })?;
        self.inner.hgetall(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.record(StoreCall::Get {
            key: key.to_string(),
        })?;
        self.inner.get(key).await
    }

    async fn set_nx(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.record(StoreCall::SetNx {
            key: key.to_string(),
        })?;
        self.inner.set_nx(key, value).await
    }

    async fn getset(&self, key: &str, value: &str) -> Result<Option<String>, StoreError> {
        self.record(StoreCall::GetSet {
            key: key.to_string(),
        })?;
        self.inner.getset(key, value).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.record(StoreCall::Exists {
            key: key.to_string(),
        })?;
        self.inner.exists(key).await
    }

    async fn del(&self, keys: &[String]) -> Result<usize, StoreError> {
        self.record(StoreCall::Del {
            keys: keys.to_vec(),
        })?;
        self.inner.del(keys).await
    }

    async fn exec(&self, batch: Batch) -> Result<Option<Vec<Reply>>, StoreError> {
        self.record(StoreCall::Exec {
            batch: batch.clone(),
        })?;

        let injected = self
            .failing_execs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::CommandFailed("injected batch failure".to_string()));
        }

        self.inner.exec(batch).await
    }

    async fn time(&self) -> Result<DateTime<Utc>, StoreError> {
        self.record(StoreCall::Time)?;
        self.inner.time().await
    }

    async fn dbsize(&self) -> Result<usize, StoreError> {
        self.record(StoreCall::DbSize)?;
        self.inner.dbsize().await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
