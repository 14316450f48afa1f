// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process store
//!
//! Keeps lists, hashes and scalars behind a single mutex, expires keys lazily
//! against the injected clock, and wakes suspended `blpop` callers whenever a
//! list receives new elements.

use super::{Batch, BatchGuard, Command, Reply, Store, StoreError};
use crate::clock::{Clock, SystemClock};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Notify;

#[derive(Debug, Clone)]
enum Value {
    Scalar(String),
    List(VecDeque<String>),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Keyspace {
    entries: HashMap<String, Entry>,
}

fn wrong_type(key: &str, expected: &'static str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        expected,
    }
}

impl Keyspace {
    fn purge(&mut self, now: Instant) {
        self.entries
            .retain(|_, entry| entry.expires_at.is_none_or(|at| at > now));
    }

    fn list(&self, key: &str) -> Result<Option<&VecDeque<String>>, StoreError> {
        match self.entries.get(key).map(|e| &e.value) {
            None => Ok(None),
            Some(Value::List(list)) => Ok(Some(list)),
            Some(_) => Err(wrong_type(key, "list")),
        }
    }

    fn list_mut(&mut self, key: &str) -> Result<&mut VecDeque<String>, StoreError> {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::List(VecDeque::new())));
        match &mut entry.value {
            Value::List(list) => Ok(list),
            _ => Err(wrong_type(key, "list")),
        }
    }

    fn hash(&self, key: &str) -> Result<Option<&HashMap<String, String>>, StoreError> {
        match self.entries.get(key).map(|e| &e.value) {
            None => Ok(None),
            Some(Value::Hash(hash)) => Ok(Some(hash)),
            Some(_) => Err(wrong_type(key, "hash")),
        }
    }

    fn hash_mut(&mut self, key: &str) -> Result<&mut HashMap<String, String>, StoreError> {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Hash(HashMap::new())));
        match &mut entry.value {
            Value::Hash(hash) => Ok(hash),
            _ => Err(wrong_type(key, "hash")),
        }
    }

    fn scalar(&self, key: &str) -> Result<Option<&String>, StoreError> {
        match self.entries.get(key).map(|e| &e.value) {
            None => Ok(None),
            Some(Value::Scalar(value)) => Ok(Some(value)),
            Some(_) => Err(wrong_type(key, "string")),
        }
    }

    /// Plain SET semantics: overwrite and clear any TTL
    fn set_scalar(&mut self, key: &str, value: &str) {
        self.entries
            .insert(key.to_string(), Entry::new(Value::Scalar(value.to_string())));
    }

    /// Collections never linger empty
    fn drop_if_empty(&mut self, key: &str) {
        let empty = match self.entries.get(key).map(|e| &e.value) {
            Some(Value::List(list)) => list.is_empty(),
            Some(Value::Hash(hash)) => hash.is_empty(),
            _ => false,
        };
        if empty {
            self.entries.remove(key);
        }
    }

    fn pop_front(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        if self.list(key)?.is_none() {
            return Ok(None);
        }
        let popped = self.list_mut(key)?.pop_front();
        self.drop_if_empty(key);
        Ok(popped)
    }

    fn guard_holds(&self, guard: &BatchGuard) -> Result<bool, StoreError> {
        match guard {
            BatchGuard::FieldExists { key, field } => {
                Ok(self.hash(key)?.is_some_and(|hash| hash.contains_key(field)))
            }
        }
    }

    fn apply(&mut self, command: &Command, now: Instant) -> Result<Reply, StoreError> {
        match command {
            Command::Del { key } => Ok(Reply::Integer(i64::from(
                self.entries.remove(key).is_some(),
            ))),
            Command::HSet { key, field, value } => {
                let added = self
                    .hash_mut(key)?
                    .insert(field.clone(), value.clone())
                    .is_none();
                Ok(Reply::Integer(i64::from(added)))
            }
            Command::HDel { key, field } => {
                if self.hash(key)?.is_none() {
                    return Ok(Reply::Integer(0));
                }
                let removed = self.hash_mut(key)?.remove(field).is_some();
                self.drop_if_empty(key);
                Ok(Reply::Integer(i64::from(removed)))
            }
            Command::LPush { key, value } => {
                let list = self.list_mut(key)?;
                list.push_front(value.clone());
                Ok(Reply::Integer(list.len() as i64))
            }
            Command::RPush { key, values } => {
                let list = self.list_mut(key)?;
                list.extend(values.iter().cloned());
                let len = list.len();
                self.drop_if_empty(key);
                Ok(Reply::Integer(len as i64))
            }
            Command::LRange { key } => Ok(Reply::Values(
                self.list(key)?
                    .map(|list| list.iter().cloned().collect())
                    .unwrap_or_default(),
            )),
            Command::HKeys { key } => {
                let mut keys: Vec<String> = self
                    .hash(key)?
                    .map(|hash| hash.keys().cloned().collect())
                    .unwrap_or_default();
                keys.sort();
                Ok(Reply::Values(keys))
            }
            Command::Set { key, value } => {
                self.set_scalar(key, value);
                Ok(Reply::Ok)
            }
            Command::Expire { key, ttl } => {
                let Some(entry) = self.entries.get_mut(key) else {
                    return Ok(Reply::Integer(0));
                };
                if ttl.is_zero() {
                    self.entries.remove(key);
                } else {
                    entry.expires_at = Some(now + *ttl);
                }
                Ok(Reply::Integer(1))
            }
            Command::Persist { key } => {
                let cleared = self
                    .entries
                    .get_mut(key)
                    .and_then(|entry| entry.expires_at.take())
                    .is_some();
                Ok(Reply::Integer(i64::from(cleared)))
            }
        }
    }
}

/// In-process implementation of [`Store`]
#[derive(Clone)]
pub struct MemoryStore<C: Clock = SystemClock> {
    keyspace: Arc<Mutex<Keyspace>>,
    pushed: Arc<Notify>,
    clock: C,
}

impl MemoryStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            keyspace: Arc::new(Mutex::new(Keyspace::default())),
            pushed: Arc::new(Notify::new()),
            clock,
        }
    }

    fn with_keyspace<T>(&self, f: impl FnOnce(&mut Keyspace) -> T) -> T {
        let now = self.clock.now();
        let mut keyspace = self.keyspace.lock().unwrap_or_else(|e| e.into_inner());
        keyspace.purge(now);
        f(&mut keyspace)
    }

    /// Live keys, sorted
    pub fn keys(&self) -> Vec<String> {
        self.with_keyspace(|ks| {
            let mut keys: Vec<String> = ks.entries.keys().cloned().collect();
            keys.sort();
            keys
        })
    }

    /// Remaining time to live of a key, if it has one
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now();
        self.with_keyspace(|ks| {
            ks.entries
                .get(key)
                .and_then(|entry| entry.expires_at)
                .map(|at| at.saturating_duration_since(now))
        })
    }
}

#[async_trait]
impl<C: Clock> Store for MemoryStore<C> {
    async fn lpop(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.with_keyspace(|ks| ks.pop_front(key))
    }

    async fn blpop(
        &self,
        key: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<String>, StoreError> {
        let deadline = timeout.map(|t| tokio::time::Instant::now() + t);

        loop {
            // Register interest before checking so a push in between is not missed
            let notified = self.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(value) = self.with_keyspace(|ks| ks.pop_front(key))? {
                return Ok(Some(value));
            }

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return Ok(None);
                    }
                }
                None => notified.await,
            }
        }
    }

    async fn llen(&self, key: &str) -> Result<usize, StoreError> {
        self.with_keyspace(|ks| Ok(ks.list(key)?.map_or(0, VecDeque::len)))
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<bool, StoreError> {
        self.with_keyspace(|ks| {
            Ok(ks
                .hash_mut(key)?
                .insert(field.to_string(), value.to_string())
                .is_none())
        })
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        self.with_keyspace(|ks| Ok(ks.hash(key)?.is_some_and(|hash| hash.contains_key(field))))
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        self.with_keyspace(|ks| Ok(ks.hash(key)?.cloned().unwrap_or_default()))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.with_keyspace(|ks| Ok(ks.scalar(key)?.cloned()))
    }

    async fn set_nx(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.with_keyspace(|ks| {
            if ks.entries.contains_key(key) {
                return Ok(false);
            }
            ks.set_scalar(key, value);
            Ok(true)
        })
    }

    async fn getset(&self, key: &str, value: &str) -> Result<Option<String>, StoreError> {
        self.with_keyspace(|ks| {
            let previous = ks.scalar(key)?.cloned();
            ks.set_scalar(key, value);
            Ok(previous)
        })
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.with_keyspace(|ks| Ok(ks.entries.contains_key(key)))
    }

    async fn del(&self, keys: &[String]) -> Result<usize, StoreError> {
        self.with_keyspace(|ks| {
            Ok(keys
                .iter()
                .filter(|key| ks.entries.remove(key.as_str()).is_some())
                .count())
        })
    }

    async fn exec(&self, batch: Batch) -> Result<Option<Vec<Reply>>, StoreError> {
        let now = self.clock.now();
        let pushes = batch
            .commands
            .iter()
            .any(|c| matches!(c, Command::LPush { .. } | Command::RPush { .. }));

        let replies = self.with_keyspace(|ks| -> Result<Option<Vec<Reply>>, StoreError> {
            if let Some(guard) = &batch.guard {
                if !ks.guard_holds(guard)? {
                    return Ok(None);
                }
            }

            // Stage on a copy so a failing command leaves nothing applied
            let mut staged = ks.clone();
            let replies = batch
                .commands
                .iter()
                .map(|command| staged.apply(command, now))
                .collect::<Result<Vec<_>, _>>()?;
            *ks = staged;
            Ok(Some(replies))
        })?;

        if pushes && replies.is_some() {
            self.pushed.notify_waiters();
        }
        Ok(replies)
    }

    async fn time(&self) -> Result<DateTime<Utc>, StoreError> {
        Ok(self.clock.utc_now())
    }

    async fn dbsize(&self) -> Result<usize, StoreError> {
        self.with_keyspace(|ks| Ok(ks.entries.len()))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
