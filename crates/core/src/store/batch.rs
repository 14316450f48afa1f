// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transactional command batches

use std::time::Duration;

/// A single command inside a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Del { key: String },
    HSet { key: String, field: String, value: String },
    HDel { key: String, field: String },
    LPush { key: String, value: String },
    RPush { key: String, values: Vec<String> },
    LRange { key: String },
    HKeys { key: String },
    Set { key: String, value: String },
    Expire { key: String, ttl: Duration },
    Persist { key: String },
}

impl Command {
    /// Key the command touches
    pub fn key(&self) -> &str {
        match self {
            Command::Del { key }
            | Command::HSet { key, .. }
            | Command::HDel { key, .. }
            | Command::LPush { key, .. }
            | Command::RPush { key, .. }
            | Command::LRange { key }
            | Command::HKeys { key }
            | Command::Set { key, .. }
            | Command::Expire { key, .. }
            | Command::Persist { key } => key,
        }
    }
}

/// Precondition checked atomically before a batch runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchGuard {
    FieldExists { key: String, field: String },
}

/// Reply to one command of an executed batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Integer(i64),
    Values(Vec<String>),
}

impl Reply {
    pub fn into_values(self) -> Vec<String> {
        match self {
            Reply::Values(values) => values,
            _ => Vec::new(),
        }
    }
}

/// Ordered commands executed all-or-nothing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub guard: Option<BatchGuard>,
    pub commands: Vec<Command>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort the whole batch unless `field` is present in hash `key`
    pub fn require_field(mut self, key: &str, field: &str) -> Self {
        self.guard = Some(BatchGuard::FieldExists {
            key: key.to_string(),
            field: field.to_string(),
        });
        self
    }

    pub fn del(mut self, key: &str) -> Self {
        self.commands.push(Command::Del { key: key.to_string() });
        self
    }

    pub fn hset(mut self, key: &str, field: &str, value: &str) -> Self {
        self.commands.push(Command::HSet {
            key: key.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn hdel(mut self, key: &str, field: &str) -> Self {
        self.commands.push(Command::HDel {
            key: key.to_string(),
            field: field.to_string(),
        });
        self
    }

    pub fn lpush(mut self, key: &str, value: &str) -> Self {
        self.commands.push(Command::LPush {
            key: key.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn rpush<I, V>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.commands.push(Command::RPush {
            key: key.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn lrange(mut self, key: &str) -> Self {
        self.commands.push(Command::LRange { key: key.to_string() });
        self
    }

    pub fn hkeys(mut self, key: &str) -> Self {
        self.commands.push(Command::HKeys { key: key.to_string() });
        self
    }

    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.commands.push(Command::Set {
            key: key.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn expire(mut self, key: &str, ttl: Duration) -> Self {
        self.commands.push(Command::Expire {
            key: key.to_string(),
            ttl,
        });
        self
    }

    pub fn persist(mut self, key: &str) -> Self {
        self.commands.push(Command::Persist { key: key.to_string() });
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
