use std::ops::RangeInclusive;

use rand::{CryptoRng, Rng, RngCore};

use crate::contract::ValidationError;

pub const SHARD_SEPARATOR: char = '-';
pub const SHARD_SUFFIX_START: u32 = 1;
pub const DEFAULT_SHARD_COUNT: u32 = 10;
pub const MAX_SHARD_COUNT: u32 = 100;
pub const PRODUCT_ID_MIN: u32 = 10_000;
pub const PRODUCT_ID_MAX: u32 = 19_999;

/// Inclusive range of shard suffixes every tenant is spread over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardRange {
    start: u32,
    end: u32,
}

impl Default for ShardRange {
    fn default() -> Self {
        Self {
            start: SHARD_SUFFIX_START,
            end: SHARD_SUFFIX_START + DEFAULT_SHARD_COUNT - 1,
        }
    }
}

impl ShardRange {
    pub fn with_shard_count(shard_count: u32) -> Result<Self, ValidationError> {
        if shard_count == 0 {
            return Err(ValidationError::new(
                "shard_count must be a positive integer",
            ));
        }
        if shard_count > MAX_SHARD_COUNT {
            return Err(ValidationError::new(format!(
                "shard_count {shard_count} exceeds MAX_SHARD_COUNT={MAX_SHARD_COUNT}"
            )));
        }
        Ok(Self {
            start: SHARD_SUFFIX_START,
            end: SHARD_SUFFIX_START + shard_count - 1,
        })
    }

    pub fn suffixes(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, suffix: u32) -> bool {
        self.suffixes().contains(&suffix)
    }

    /// Every partition key of a tenant, in suffix order.
    pub fn shard_ids(&self, tenant_id: &str) -> Vec<String> {
        self.suffixes()
            .map(|suffix| shard_id(tenant_id, suffix))
            .collect()
    }

    pub fn random_suffix<R: RngCore + CryptoRng>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.suffixes())
    }
}

pub fn shard_id(tenant_id: &str, suffix: u32) -> String {
    format!("{tenant_id}{SHARD_SEPARATOR}{suffix}")
}

pub fn tenant_prefix(tenant_id: &str) -> String {
    format!("{tenant_id}{SHARD_SEPARATOR}")
}

pub fn belongs_to_tenant(shard_id: &str, tenant_id: &str) -> bool {
    shard_id
        .strip_prefix(tenant_id)
        .and_then(|rest| rest.strip_prefix(SHARD_SEPARATOR))
        .is_some()
}

/// Numeric suffix of `shard_id` when it is one of `tenant_id`'s shards.
pub fn shard_suffix(shard_id: &str, tenant_id: &str) -> Option<u32> {
    shard_id
        .strip_prefix(tenant_id)?
        .strip_prefix(SHARD_SEPARATOR)?
        .parse()
        .ok()
}

pub fn random_product_id<R: RngCore + CryptoRng>(rng: &mut R) -> String {
    rng.gen_range(PRODUCT_ID_MIN..=PRODUCT_ID_MAX).to_string()
}
