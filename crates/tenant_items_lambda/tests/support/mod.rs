#![allow(dead_code)]

use std::sync::Arc;

use tenant_items_core::request::ItemsRequest;
use tenant_items_lambda::adapters::memory::MemoryBackend;
use tenant_items_lambda::config::ServiceConfig;
use tenant_items_lambda::handlers::broker::CredentialBroker;
use tenant_items_lambda::handlers::dispatcher::ItemsService;

pub const TABLE_ARN: &str = "arn:aws:dynamodb:eu-west-1:123456789012:table/Items";
pub const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/TenantAssumeRole";

pub fn test_config() -> ServiceConfig {
    ServiceConfig::new("eu-west-1", TABLE_ARN, "Items", ROLE_ARN)
}

/// A service wired to one in-memory backend for identity, queries and
/// scoped tables.
pub fn memory_service(config: &ServiceConfig) -> (MemoryBackend, ItemsService) {
    let backend = MemoryBackend::new(config.table_arn.clone());
    let service = ItemsService::new(
        config,
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
    );
    (backend, service)
}

pub fn memory_broker(backend: &MemoryBackend) -> CredentialBroker {
    CredentialBroker::new(Arc::new(backend.clone()), &test_config())
}

pub fn list_request(tenant_id: &str) -> ItemsRequest {
    ItemsRequest::new("GET").with_query("tenant_id", tenant_id)
}

pub fn lookup_request(tenant_id: &str, shard_id: &str, product_id: &str) -> ItemsRequest {
    ItemsRequest::new("GET")
        .with_query("tenant_id", tenant_id)
        .with_query("shard_id", shard_id)
        .with_query("product_id", product_id)
}

pub fn create_request(tenant_id: &str) -> ItemsRequest {
    ItemsRequest::new("POST").with_body(format!("{{\"tenant_id\":\"{tenant_id}\"}}"))
}

/// Splits the shard list out of a seed success message.
pub fn created_shard_ids(message: &str) -> Vec<String> {
    message
        .strip_prefix("Items with these Shard Ids created : ")
        .map(|list| list.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}
