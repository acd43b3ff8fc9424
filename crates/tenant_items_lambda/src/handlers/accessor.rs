use tenant_items_core::contract::Item;
use tracing::{debug, warn};

use crate::adapters::item_store::ScopedItemTable;
use crate::error::{ItemsError, Result};

/// Result of a point lookup. A missing item is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemLookup {
    Found(Item),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAck {
    pub shard_id: String,
    pub product_id: String,
}

/// Reads one item through a scoped table.
///
/// The shard prefix is deliberately not compared with the session's tenant
/// here: a mismatching key is refused by the store and surfaces as
/// [`ItemsError::Access`].
pub async fn get_item(
    table: &dyn ScopedItemTable,
    shard_id: &str,
    product_id: &str,
) -> Result<ItemLookup> {
    match table.get_item(shard_id, product_id).await {
        Ok(Some(item)) => Ok(ItemLookup::Found(item)),
        Ok(None) => {
            debug!(component = "accessor", event = "item_not_found", shard_id, product_id);
            Ok(ItemLookup::NotFound)
        }
        Err(error) => {
            warn!(
                component = "accessor",
                event = "get_item_failed",
                shard_id,
                product_id,
                error = %error,
            );
            Err(ItemsError::from_store(error, shard_id, product_id))
        }
    }
}

pub async fn put_item(
    table: &dyn ScopedItemTable,
    shard_id: &str,
    product_id: &str,
    payload: &str,
) -> Result<WriteAck> {
    let item = Item::new(shard_id, product_id, payload);
    table.put_item(&item).await.map_err(|error| {
        warn!(
            component = "accessor",
            event = "put_item_failed",
            shard_id,
            product_id,
            error = %error,
        );
        ItemsError::from_store(error, shard_id, product_id)
    })?;

    Ok(WriteAck {
        shard_id: item.shard_id,
        product_id: item.product_id,
    })
}
