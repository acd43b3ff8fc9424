use rand::{CryptoRng, RngCore};
use tenant_items_core::contract::SAMPLE_PAYLOAD;
use tenant_items_core::sharding::{random_product_id, shard_id, ShardRange};
use tracing::info;

use crate::adapters::item_store::ScopedTableFactory;
use crate::error::Result;
use crate::handlers::accessor::put_item;
use crate::handlers::broker::CredentialBroker;

/// Writes `count` synthetic items for `tenant_id` and returns their shard IDs
/// in write order.
///
/// One scoped session is issued for the whole batch. Writes are sequential
/// and not atomic: an error stops the batch and keeps what was already
/// written. Product ID collisions overwrite silently.
pub async fn seed<R>(
    broker: &CredentialBroker,
    tables: &dyn ScopedTableFactory,
    tenant_id: &str,
    count: usize,
    shards: ShardRange,
    rng: &mut R,
) -> Result<Vec<String>>
where
    R: RngCore + CryptoRng + Send,
{
    let session = broker.scope_to_tenant(tenant_id).await?;
    let table = tables.open(&session);

    let mut shard_ids = Vec::new();
    for _ in 0..count {
        let target_shard = shard_id(tenant_id, shards.random_suffix(rng));
        let product_id = random_product_id(rng);
        put_item(table.as_ref(), &target_shard, &product_id, SAMPLE_PAYLOAD).await?;
        shard_ids.push(target_shard);
    }

    info!(
        component = "seeder",
        event = "items_seeded",
        tenant_id,
        items = shard_ids.len(),
        shard_ids = %shard_ids.join(","),
    );
    Ok(shard_ids)
}
