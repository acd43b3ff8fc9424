use std::time::Duration;

use tenant_items_core::contract::DEFAULT_SEED_ITEMS_PER_REQUEST;
use tenant_items_core::sharding::{ShardRange, DEFAULT_SHARD_COUNT};

use crate::error::ConfigError;

pub const DEFAULT_SESSION_NAME: &str = "tenant-aware-product";
pub const DEFAULT_CREDENTIAL_DURATION_SECONDS: u64 = 900;
pub const MIN_CREDENTIAL_DURATION_SECONDS: u64 = 900;
pub const MAX_CREDENTIAL_DURATION_SECONDS: u64 = 43_200;
pub const DEFAULT_SHARD_QUERY_TIMEOUT_MS: u64 = 5_000;
pub const MAX_SEED_ITEMS_PER_REQUEST: u64 = 100;

/// Runtime settings read once per cold start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub region: String,
    pub table_arn: String,
    pub table_name: String,
    pub assume_role_arn: String,
    pub session_name: String,
    pub credential_duration: Duration,
    pub seed_items_per_request: usize,
    pub shard_range: ShardRange,
    pub shard_query_timeout: Duration,
}

impl ServiceConfig {
    /// Settings for the given table and base role with every tunable at its
    /// default.
    pub fn new(
        region: impl Into<String>,
        table_arn: impl Into<String>,
        table_name: impl Into<String>,
        assume_role_arn: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            table_arn: table_arn.into(),
            table_name: table_name.into(),
            assume_role_arn: assume_role_arn.into(),
            session_name: DEFAULT_SESSION_NAME.to_string(),
            credential_duration: Duration::from_secs(DEFAULT_CREDENTIAL_DURATION_SECONDS),
            seed_items_per_request: DEFAULT_SEED_ITEMS_PER_REQUEST,
            shard_range: ShardRange::default(),
            shard_query_timeout: Duration::from_millis(DEFAULT_SHARD_QUERY_TIMEOUT_MS),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let optional_number = |key: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(key) {
                None => Ok(default),
                Some(raw) => raw.trim().parse().map_err(|error| ConfigError::Invalid {
                    key,
                    value: raw.clone(),
                    reason: format!("{error}"),
                }),
            }
        };

        let credential_seconds = optional_number(
            "CREDENTIAL_DURATION_SECONDS",
            DEFAULT_CREDENTIAL_DURATION_SECONDS,
        )?;
        if !(MIN_CREDENTIAL_DURATION_SECONDS..=MAX_CREDENTIAL_DURATION_SECONDS)
            .contains(&credential_seconds)
        {
            return Err(ConfigError::Invalid {
                key: "CREDENTIAL_DURATION_SECONDS",
                value: credential_seconds.to_string(),
                reason: format!(
                    "must be between {MIN_CREDENTIAL_DURATION_SECONDS} and {MAX_CREDENTIAL_DURATION_SECONDS}"
                ),
            });
        }

        let shard_count = optional_number("SHARD_COUNT", u64::from(DEFAULT_SHARD_COUNT))?;
        let shard_range = u32::try_from(shard_count)
            .map_err(|error| error.to_string())
            .and_then(|count| {
                ShardRange::with_shard_count(count).map_err(|error| error.message().to_string())
            })
            .map_err(|reason| ConfigError::Invalid {
                key: "SHARD_COUNT",
                value: shard_count.to_string(),
                reason,
            })?;

        let timeout_ms = optional_number("SHARD_QUERY_TIMEOUT_MS", DEFAULT_SHARD_QUERY_TIMEOUT_MS)?;
        if timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "SHARD_QUERY_TIMEOUT_MS",
                value: timeout_ms.to_string(),
                reason: "must be a positive integer".to_string(),
            });
        }

        let seed_items = optional_number(
            "SEED_ITEMS_PER_REQUEST",
            DEFAULT_SEED_ITEMS_PER_REQUEST as u64,
        )?;
        if !(1..=MAX_SEED_ITEMS_PER_REQUEST).contains(&seed_items) {
            return Err(ConfigError::Invalid {
                key: "SEED_ITEMS_PER_REQUEST",
                value: seed_items.to_string(),
                reason: format!("must be between 1 and {MAX_SEED_ITEMS_PER_REQUEST}"),
            });
        }

        Ok(Self {
            region: required("AWS_REGION_NAME")?,
            table_arn: required("DYNAMO_TABLE_ARN")?,
            table_name: required("DYNAMO_TABLE_NAME")?,
            assume_role_arn: required("DYNAMO_ASSUME_ROLE_ARN")?,
            session_name: lookup("TENANT_SESSION_NAME")
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string()),
            credential_duration: Duration::from_secs(credential_seconds),
            seed_items_per_request: seed_items as usize,
            shard_range,
            shard_query_timeout: Duration::from_millis(timeout_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| values.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("AWS_REGION_NAME", "eu-west-1"),
        (
            "DYNAMO_TABLE_ARN",
            "arn:aws:dynamodb:eu-west-1:123456789012:table/Items",
        ),
        ("DYNAMO_TABLE_NAME", "Items"),
        (
            "DYNAMO_ASSUME_ROLE_ARN",
            "arn:aws:iam::123456789012:role/TenantAssumeRole",
        ),
    ];

    #[test]
    fn required_values_with_defaults() {
        let config = ServiceConfig::from_lookup(lookup_from(&REQUIRED)).expect("config");

        assert_eq!(config.table_name, "Items");
        assert_eq!(config.session_name, DEFAULT_SESSION_NAME);
        assert_eq!(config.credential_duration, Duration::from_secs(900));
        assert_eq!(config.seed_items_per_request, 3);
        assert_eq!(config.shard_range, ShardRange::default());
        assert_eq!(config.shard_query_timeout, Duration::from_millis(5_000));
    }

    #[test]
    fn missing_required_value_is_reported() {
        let error = ServiceConfig::from_lookup(lookup_from(&REQUIRED[..3]))
            .expect_err("role arn is missing");
        assert_eq!(error, ConfigError::Missing("DYNAMO_ASSUME_ROLE_ARN"));
    }

    #[test]
    fn optional_values_are_validated() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CREDENTIAL_DURATION_SECONDS", "60"));
        assert!(ServiceConfig::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SHARD_COUNT", "0"));
        assert!(ServiceConfig::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SEED_ITEMS_PER_REQUEST", "three"));
        assert!(ServiceConfig::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs.extend([("SHARD_COUNT", "4"), ("SHARD_QUERY_TIMEOUT_MS", "250")]);
        let config = ServiceConfig::from_lookup(lookup_from(&pairs)).expect("config");
        assert_eq!(config.shard_range.len(), 4);
        assert_eq!(config.shard_query_timeout, Duration::from_millis(250));
    }

    #[test]
    fn seed_item_count_is_bounded() {
        for raw in ["0", "101", "18446744073709551615"] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push(("SEED_ITEMS_PER_REQUEST", raw));
            let error = ServiceConfig::from_lookup(lookup_from(&pairs))
                .expect_err("out-of-range seed count should fail");
            assert!(
                matches!(error, ConfigError::Invalid { key: "SEED_ITEMS_PER_REQUEST", .. }),
                "{raw}: {error:?}"
            );
        }

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SEED_ITEMS_PER_REQUEST", "100"));
        let config = ServiceConfig::from_lookup(lookup_from(&pairs)).expect("config");
        assert_eq!(config.seed_items_per_request, 100);
    }
}
