// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pool tokens and per-instance bookkeeping

use serde::{Deserialize, Serialize};

/// One of the pool's interchangeable slot identifiers
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token(pub String);

impl Token {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tokens this instance acquired and has not yet released, oldest first.
///
/// Only answers "does this instance hold anything"; the store's holder map is
/// the source of truth.
#[derive(Clone, Debug, Default)]
pub struct HeldTokens {
    tokens: Vec<Token>,
}

impl HeldTokens {
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Forget the most recent entry for `token`
    pub fn remove(&mut self, token: &Token) -> bool {
        match self.tokens.iter().rposition(|t| t == token) {
            Some(index) => {
                self.tokens.remove(index);
                true
            }
            None => false,
        }
    }

    /// Most recently acquired token
    pub fn last(&self) -> Option<&Token> {
        self.tokens.last()
    }

    pub fn snapshot(&self) -> Vec<Token> {
        self.tokens.clone()
    }
}
