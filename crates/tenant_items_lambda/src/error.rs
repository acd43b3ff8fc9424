//! Error types for tenant-scoped item access.
//!
//! - `CredentialError`: the identity service refused to issue scoped
//!   credentials, or returned an unusable response.
//! - `StoreError`: a store call failed. `AccessDenied` is the store enforcing
//!   the session policy and is the tenant isolation boundary.
//! - `ItemsError`: what handlers return to the dispatcher.
//! - `ConfigError`: the runtime environment is incomplete at cold start.

use std::time::Duration;

use tenant_items_core::contract::{ShardFailure, ValidationError};

pub type Result<T, E = ItemsError> = core::result::Result<T, E>;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Credential error: {message}")]
pub struct CredentialError {
    pub message: String,
}

impl CredentialError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Store error: {0}")]
    Backend(String),

    #[error("Malformed item: {0}")]
    MalformedItem(String),

    #[error("Shard query timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ItemsError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The store rejected the key for the session's policy.
    #[error("Access denied for key ({shard_id}, {product_id}): {reason}")]
    Access {
        shard_id: String,
        product_id: String,
        reason: String,
    },

    #[error(transparent)]
    Store(StoreError),

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error(
        "{} of {total_shards} shard queries failed: {}",
        .failures.len(),
        failed_shard_list(.failures)
    )]
    PartialFailure {
        total_shards: usize,
        failures: Vec<ShardFailure>,
    },
}

impl ItemsError {
    pub(crate) fn from_store(error: StoreError, shard_id: &str, product_id: &str) -> Self {
        match error {
            StoreError::AccessDenied(reason) => Self::Access {
                shard_id: shard_id.to_string(),
                product_id: product_id.to_string(),
                reason,
            },
            other => Self::Store(other),
        }
    }
}

fn failed_shard_list(failures: &[ShardFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("{} ({})", failure.shard_id, failure.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),

    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
