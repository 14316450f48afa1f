// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semaphore errors

use super::config::ConfigError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors surfaced by semaphore operations.
///
/// An acquisition timing out is not an error; it yields `Ok(None)`.
#[derive(Debug, Error)]
pub enum SemaphoreError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
