// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Distributed counting semaphore
//!
//! A pool of `resources` tokens lives in the store as a list of available
//! tokens plus a hash of held tokens with their acquisition times. Processes
//! never talk to each other: every transition is a single atomic store
//! operation or a transactional batch.

use super::config::SemaphoreConfig;
use super::error::SemaphoreError;
use super::guard::TokenGuard;
use super::keys::PoolKeys;
use super::pool::{Pool, EXISTS_TOKEN};
use super::reclaim::{ReclaimOutcome, StaleReclaimer};
use super::throttle::Throttle;
use super::token::{HeldTokens, Token};
use crate::clock::{Clock, SystemClock};
use crate::store::{Batch, Store, StoreError};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

struct Inner<S: Store, C: Clock> {
    config: SemaphoreConfig,
    pool: Pool<S, C>,
    reclaimer: Option<StaleReclaimer<S, C>>,
    throttle: Throttle,
    held: Mutex<HeldTokens>,
    client_id: Uuid,
}

/// Handle on a named pool for one client.
///
/// Clones share the same client state (held tokens, throttle).
pub struct Semaphore<S: Store, C: Clock = SystemClock> {
    inner: Arc<Inner<S, C>>,
}

impl<S: Store, C: Clock> Clone for Semaphore<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Store> Semaphore<S, SystemClock> {
    pub fn new(store: S, config: SemaphoreConfig) -> Result<Self, SemaphoreError> {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: Store, C: Clock> Semaphore<S, C> {
    pub fn with_clock(store: S, config: SemaphoreConfig, clock: C) -> Result<Self, SemaphoreError> {
        config.validate()?;
        let pool = Pool::new(store, clock, &config);
        let reclaimer = config
            .stale_client_timeout
            .map(|stale_after| StaleReclaimer::new(pool.clone(), stale_after));

        Ok(Self {
            inner: Arc::new(Inner {
                throttle: Throttle::new(config.create_release_interval),
                config,
                pool,
                reclaimer,
                held: Mutex::new(HeldTokens::default()),
                client_id: Uuid::new_v4(),
            }),
        })
    }

    pub fn config(&self) -> &SemaphoreConfig {
        &self.inner.config
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn keys(&self) -> &PoolKeys {
        self.inner.pool.keys()
    }

    pub fn client_id(&self) -> Uuid {
        self.inner.client_id
    }

    fn held(&self) -> std::sync::MutexGuard<'_, HeldTokens> {
        self.inner.held.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Acquire a token, allowing one retry after pool recovery.
    ///
    /// `None` blocks until a token arrives; `Some(Duration::ZERO)` never
    /// blocks; any other value bounds the wait. Returns `Ok(None)` on timeout.
    pub async fn acquire(&self, timeout: Option<Duration>) -> Result<Option<Token>, SemaphoreError> {
        self.acquire_with(timeout, true).await
    }

    /// Single non-blocking attempt (plus the recovery retry)
    pub async fn try_acquire(&self) -> Result<Option<Token>, SemaphoreError> {
        self.acquire(Some(Duration::ZERO)).await
    }

    /// Acquire a token, choosing whether a failed attempt may be retried once
    /// after pool creation / stale reclamation ran.
    pub async fn acquire_with(
        &self,
        timeout: Option<Duration>,
        allow_retry: bool,
    ) -> Result<Option<Token>, SemaphoreError> {
        let blocking = !matches!(timeout, Some(t) if t.is_zero());
        // A blocking wait on a queue nobody will ever create would never return.
        // The pool may expire or be destroyed by others, so check every time.
        if blocking && !self.exists().await? {
            self.ensure_exists().await?;
        }

        let mut retry = allow_retry;
        loop {
            if let Some(token) = self.pop(timeout).await? {
                self.record_holder(&token).await?;
                return Ok(Some(token));
            }

            if !self.inner.throttle.try_begin(self.inner.pool.clock()) {
                tracing::trace!(pool = %self.name(), "acquire failed, recovery throttled");
                return Ok(None);
            }
            self.recover().await?;

            if !retry {
                return Ok(None);
            }
            retry = false;
        }
    }

    /// Acquire a token wrapped in a guard that releases it on drop
    pub async fn acquire_guard(
        &self,
        timeout: Option<Duration>,
    ) -> Result<Option<TokenGuard<S, C>>, SemaphoreError> {
        Ok(self
            .acquire(timeout)
            .await?
            .map(|token| TokenGuard::new(self.clone(), token)))
    }

    /// Run `work` while holding a token; the token is released afterwards on
    /// every path, including when `work` panics.
    ///
    /// Returns `Ok(None)` without running `work` if no token was obtained.
    pub async fn with_token<F, Fut, T>(
        &self,
        timeout: Option<Duration>,
        work: F,
    ) -> Result<Option<T>, SemaphoreError>
    where
        F: FnOnce(Token) -> Fut,
        Fut: Future<Output = T>,
    {
        let Some(guard) = self.acquire_guard(timeout).await? else {
            return Ok(None);
        };
        let output = work(guard.token().clone()).await;
        guard.release().await?;
        Ok(Some(output))
    }

    /// Return `token` to the pool. False when it was not held.
    pub async fn release(&self, token: &Token) -> Result<bool, SemaphoreError> {
        self.held().remove(token);
        let released = self.inner.pool.requeue(token).await?;
        if released {
            tracing::debug!(pool = %self.name(), client = %self.inner.client_id, %token, "released");
        } else {
            tracing::debug!(pool = %self.name(), %token, "release of unheld token ignored");
        }
        Ok(released)
    }

    /// Release the most recent token this instance acquired
    pub async fn unlock(&self) -> Result<Option<Token>, SemaphoreError> {
        let Some(token) = self.held().last().cloned() else {
            return Ok(None);
        };
        Ok(self.release(&token).await?.then_some(token))
    }

    /// Whether `token` is currently held by anyone
    pub async fn is_locked(&self, token: &Token) -> Result<bool, SemaphoreError> {
        Ok(self
            .inner
            .pool
            .store()
            .hexists(&self.keys().grabbed, token.as_str())
            .await?)
    }

    /// Whether this instance still holds any token it acquired
    pub async fn holds_any(&self) -> Result<bool, SemaphoreError> {
        let held = self.held().snapshot();
        for token in held.iter().rev() {
            if self.is_locked(token).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Tokens this instance believes it holds, oldest first
    pub fn held_tokens(&self) -> Vec<Token> {
        self.held().snapshot()
    }

    /// Free tokens, or the configured capacity before the pool exists
    pub async fn available_count(&self) -> Result<usize, SemaphoreError> {
        if self.exists().await? {
            Ok(self.inner.pool.store().llen(&self.keys().available).await?)
        } else {
            Ok(self.inner.config.resources as usize)
        }
    }

    pub async fn exists(&self) -> Result<bool, SemaphoreError> {
        Ok(self.inner.pool.store().exists(&self.keys().exists).await?)
    }

    /// Flag the pool as existing; the call that flips the flag creates it.
    ///
    /// Returns true only when this call created the pool.
    pub async fn ensure_exists(&self) -> Result<bool, SemaphoreError> {
        let pool = &self.inner.pool;
        let previous = pool
            .store()
            .getset(&self.keys().exists, EXISTS_TOKEN)
            .await?;

        let created = match previous {
            None => {
                pool.create().await?;
                tracing::info!(
                    pool = %self.name(),
                    resources = self.inner.config.resources,
                    client = %self.inner.client_id,
                    "created pool"
                );
                true
            }
            Some(_) => {
                pool.refresh_expiration().await?;
                false
            }
        };

        Ok(created)
    }

    /// Remove every pool key, returning the store to its pre-creation state
    pub async fn destroy(&self) -> Result<(), SemaphoreError> {
        let removed = self.inner.pool.destroy().await?;
        *self.held() = HeldTokens::default();
        tracing::info!(pool = %self.name(), removed, "destroyed pool");
        Ok(())
    }

    /// Requeue tokens held past `stale_client_timeout`.
    ///
    /// Skipped when staleness checking is off or another process is scanning.
    pub async fn reclaim_stale(&self) -> Result<ReclaimOutcome, SemaphoreError> {
        match &self.inner.reclaimer {
            Some(reclaimer) => Ok(reclaimer.reclaim().await?),
            None => Ok(ReclaimOutcome::Skipped),
        }
    }

    /// Every token in the pool, available ones first
    pub async fn all_tokens(&self) -> Result<Vec<Token>, SemaphoreError> {
        Ok(self.inner.pool.all_tokens().await?)
    }

    async fn pop(&self, timeout: Option<Duration>) -> Result<Option<Token>, StoreError> {
        let store = self.inner.pool.store();
        let key = &self.keys().available;
        let popped = match timeout {
            Some(t) if t.is_zero() => store.lpop(key).await?,
            timeout => store.blpop(key, timeout).await?,
        };
        Ok(popped.map(Token))
    }

    async fn record_holder(&self, token: &Token) -> Result<(), StoreError> {
        let pool = &self.inner.pool;
        let recorded = match pool.now_millis().await {
            Ok(now) => pool.grab(token, now).await,
            Err(e) => Err(e),
        };

        if let Err(e) = recorded {
            // Put the token back rather than lose it between the two places
            let restore = Batch::new().lpush(&self.keys().available, token.as_str());
            if let Err(restore_err) = pool.store().exec(restore).await {
                tracing::error!(pool = %self.name(), %token, error = %restore_err, "failed to restore token");
            }
            return Err(e);
        }

        self.held().push(token.clone());
        tracing::debug!(pool = %self.name(), client = %self.inner.client_id, %token, "acquired");
        Ok(())
    }

    /// Create the pool if needed, then reclaim stale holders if configured
    async fn recover(&self) -> Result<(), SemaphoreError> {
        self.ensure_exists().await?;
        if let Some(reclaimer) = &self.inner.reclaimer {
            let outcome = reclaimer.reclaim().await?;
            tracing::debug!(
                pool = %self.name(),
                reclaimed = outcome.reclaimed().len(),
                skipped = matches!(outcome, ReclaimOutcome::Skipped),
                "stale check"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "semaphore_tests.rs"]
mod tests;
