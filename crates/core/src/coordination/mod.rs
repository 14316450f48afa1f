// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Distributed counting semaphore over a shared key-value store
//!
//! This module provides:
//! - **Semaphore** - Acquire/release protocol with lazy pool creation
//! - **TokenGuard** - Scoped ownership that always gives the token back
//! - **StaleReclaimer** - Requeues tokens from holders that went away
//! - **ExpiringMutex** - Self-healing mutual exclusion serializing reclamation

pub mod config;
pub mod error;
pub mod guard;
pub mod keys;
pub mod mutex;
pub mod pool;
pub mod reclaim;
pub mod semaphore;
pub mod throttle;
pub mod token;

pub use config::{ConfigError, SemaphoreConfig, DEFAULT_CREATE_RELEASE_INTERVAL};
pub use error::SemaphoreError;
pub use guard::TokenGuard;
pub use keys::PoolKeys;
pub use mutex::{ExpiringMutex, SKEW_GRACE};
pub use pool::{Pool, API_VERSION, CREATION_TTL, EXISTS_TOKEN};
pub use reclaim::{ReclaimOutcome, StaleReclaimer, RECLAIM_MUTEX_TTL};
pub use semaphore::Semaphore;
pub use throttle::Throttle;
pub use token::{HeldTokens, Token};
