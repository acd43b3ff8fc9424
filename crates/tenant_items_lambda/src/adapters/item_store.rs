use async_trait::async_trait;
use tenant_items_core::contract::Item;

use crate::adapters::credentials::ScopedSession;
use crate::error::StoreError;

/// Unscoped, read-only partition queries used by the fan-out path. The
/// partition key already names the tenant.
#[async_trait]
pub trait PartitionReader: Send + Sync {
    async fn query_partition(&self, shard_id: &str) -> Result<Vec<Item>, StoreError>;
}

/// Point reads and writes made with a tenant-scoped session. Access to keys
/// outside the session's prefix is refused by the store, not checked here.
#[async_trait]
pub trait ScopedItemTable: Send + Sync {
    async fn get_item(&self, shard_id: &str, product_id: &str)
        -> Result<Option<Item>, StoreError>;

    async fn put_item(&self, item: &Item) -> Result<(), StoreError>;
}

pub trait ScopedTableFactory: Send + Sync {
    fn open(&self, session: &ScopedSession) -> Box<dyn ScopedItemTable>;
}
