//! Shared multi-tenant item access primitives.
//!
//! This crate owns the deterministic parts of the service: the item contract,
//! shard naming, tenant policy construction and request routing. It
//! intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod contract;
pub mod policy;
pub mod request;
pub mod sharding;
