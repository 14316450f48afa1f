// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! turnstile-core: distributed counting semaphore
//!
//! This crate provides:
//! - The `Store` contract the protocol needs, plus an in-process `MemoryStore`
//! - The semaphore protocol: lazy pool creation, acquire/release, scoped guards
//! - Stale holder reclamation under a self-expiring mutex
//! - A clock abstraction so time-dependent behaviour is testable

pub mod clock;
pub mod coordination;
pub mod store;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use coordination::{
    ConfigError, ReclaimOutcome, Semaphore, SemaphoreConfig, SemaphoreError, Token, TokenGuard,
};
pub use store::{Batch, BatchGuard, Command, MemoryStore, Reply, Store, StoreError};
