//! Rotating optimistic-concurrency tokens.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque compare key rotated on every accepted write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of fresh tokens. Implementations must never hand out the same
/// token twice for one account.
pub trait TokenSource: Send + Sync {
    fn next_token(&self) -> Token;
}

/// 128 random bits rendered as lowercase hex.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokens;

impl TokenSource for RandomTokens {
    fn next_token(&self) -> Token {
        let bits: u128 = rand::thread_rng().r#gen();
        Token(format!("{bits:032x}"))
    }
}
