// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scoped token ownership

use super::error::SemaphoreError;
use super::semaphore::Semaphore;
use super::token::Token;
use crate::clock::Clock;
use crate::store::Store;

/// A held token that goes back to the pool when the guard is released or dropped.
///
/// Dropping hands the release to the current tokio runtime; outside a runtime
/// the token stays held until stale reclamation picks it up. Prefer
/// [`TokenGuard::release`] to observe the outcome.
pub struct TokenGuard<S: Store, C: Clock> {
    semaphore: Semaphore<S, C>,
    token: Token,
    released: bool,
}

impl<S: Store, C: Clock> TokenGuard<S, C> {
    pub(crate) fn new(semaphore: Semaphore<S, C>, token: Token) -> Self {
        Self {
            semaphore,
            token,
            released: false,
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Release now and report whether the token was still held.
    ///
    /// On error, or if this future is dropped mid-flight, the guard falls
    /// back to the release on drop.
    pub async fn release(mut self) -> Result<bool, SemaphoreError> {
        let released = self.semaphore.release(&self.token).await?;
        self.released = true;
        Ok(released)
    }
}

impl<S: Store, C: Clock> std::fmt::Debug for TokenGuard<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGuard")
            .field("pool", &self.semaphore.name())
            .field("token", &self.token)
            .finish()
    }
}

impl<S: Store, C: Clock> Drop for TokenGuard<S, C> {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let semaphore = self.semaphore.clone();
        let token = self.token.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = semaphore.release(&token).await {
                        tracing::error!(pool = %semaphore.name(), %token, error = %e, "release on drop failed");
                    }
                });
            }
            Err(_) => tracing::warn!(
                pool = %self.semaphore.name(),
                token = %self.token,
                "guard dropped outside a runtime, token left for stale reclamation"
            ),
        }
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
