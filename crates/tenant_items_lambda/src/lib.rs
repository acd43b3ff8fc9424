//! AWS-oriented adapters and handlers for tenant-scoped item access.
//!
//! This crate owns runtime integration details (the Lambda request handler,
//! STS role assumption and DynamoDB access) on top of the routing, sharding
//! and policy primitives from `tenant_items_core`.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod telemetry;
