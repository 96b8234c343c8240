//! Error taxonomy surfaced by account and party operations.
use thiserror::Error;

use crate::address::Address;
use crate::token::Token;

/// Classified failures for every account operation.
///
/// No raw persistence error crosses the store boundary; anything the store
/// cannot classify is reported as [`GrailError::Unknown`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrailError {
    #[error("no grail found for address {address}")]
    NotFound { address: Address },
    #[error("a grail already exists for address {address}")]
    DuplicateKey { address: Address },
    #[error("wrong password for address {address}")]
    WrongPassword { address: Address },
    #[error("stale token for address {address} (specified {specified}, current {current})")]
    StaleToken {
        address: Address,
        current: Token,
        specified: Token,
    },
    #[error("missing or invalid argument `{field}`")]
    Validation { field: &'static str },
    #[error("unknown persistence failure: {0}")]
    Unknown(String),
}

impl GrailError {
    /// Whether the caller can recover by refetching and retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StaleToken { .. })
    }

    /// Token to resynchronize with after a [`GrailError::StaleToken`].
    #[must_use]
    pub const fn current_token(&self) -> Option<&Token> {
        match self {
            Self::StaleToken { current, .. } => Some(current),
            _ => None,
        }
    }
}

/// Failures raised while persisting documents. Private to store implementations;
/// callers only ever see [`GrailError`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document already exists: {0}")]
    Duplicate(Address),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

impl From<StoreError> for GrailError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Duplicate(address) => Self::DuplicateKey { address },
            other => Self::Unknown(other.to_string()),
        }
    }
}
