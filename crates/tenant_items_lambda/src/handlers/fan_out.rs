use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tenant_items_core::contract::{ItemGroup, ShardFailure};
use tenant_items_core::sharding::ShardRange;
use tracing::{info, warn};

use crate::adapters::item_store::PartitionReader;
use crate::error::{ItemsError, StoreError};

/// Aggregate of one fan-out read.
///
/// `groups` holds one entry per non-empty shard in completion order.
/// `failures` names every shard whose query errored, timed out or whose task
/// was aborted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutResult {
    pub groups: Vec<ItemGroup>,
    pub failures: Vec<ShardFailure>,
    pub shards_queried: usize,
}

impl FanOutResult {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|group| group.items.len()).sum()
    }

    pub fn partial_failure(&self) -> Option<ItemsError> {
        if self.is_complete() {
            return None;
        }
        Some(ItemsError::PartialFailure {
            total_shards: self.shards_queried,
            failures: self.failures.clone(),
        })
    }
}

/// Queries every shard of `tenant_id` concurrently and waits for all of them.
///
/// One task is spawned per shard regardless of which shards hold data. The
/// queries run with the reader's own credentials: the partition key already
/// names the tenant.
pub async fn get_all_items(
    reader: Arc<dyn PartitionReader>,
    tenant_id: &str,
    shards: ShardRange,
    query_timeout: Duration,
) -> FanOutResult {
    let started_at = Instant::now();
    let shard_ids = shards.shard_ids(tenant_id);
    let mut pending = FuturesUnordered::new();

    for shard_id in &shard_ids {
        let task_reader = Arc::clone(&reader);
        let task_shard_id = shard_id.clone();
        let handle = tokio::spawn(async move {
            match tokio::time::timeout(query_timeout, task_reader.query_partition(&task_shard_id))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout(query_timeout)),
            }
        });
        let shard_id = shard_id.clone();
        pending.push(async move { (shard_id, handle.await) });
    }

    let mut result = FanOutResult {
        shards_queried: shard_ids.len(),
        ..FanOutResult::default()
    };

    while let Some((shard_id, joined)) = pending.next().await {
        match joined {
            Ok(Ok(items)) if items.is_empty() => {}
            Ok(Ok(items)) => result.groups.push(ItemGroup { shard_id, items }),
            Ok(Err(error)) => {
                warn!(
                    component = "fan_out",
                    event = "shard_query_failed",
                    tenant_id,
                    shard_id = %shard_id,
                    error = %error,
                );
                result.failures.push(ShardFailure {
                    shard_id,
                    reason: error.to_string(),
                });
            }
            Err(join_error) => {
                warn!(
                    component = "fan_out",
                    event = "shard_task_aborted",
                    tenant_id,
                    shard_id = %shard_id,
                    error = %join_error,
                );
                result.failures.push(ShardFailure {
                    shard_id,
                    reason: format!("shard query task aborted: {join_error}"),
                });
            }
        }
    }

    info!(
        component = "fan_out",
        event = "fan_out_completed",
        tenant_id,
        shards_queried = result.shards_queried,
        non_empty_shards = result.groups.len(),
        failed_shards = result.failures.len(),
        items = result.item_count(),
        duration_ms = started_at.elapsed().as_millis() as u64,
    );

    result
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tenant_items_core::contract::Item;

    use super::*;

    struct ScriptedReader {
        items: Vec<Item>,
        panic_on: Option<String>,
        queried: Mutex<Vec<String>>,
    }

    impl ScriptedReader {
        fn new(items: Vec<Item>) -> Self {
            Self {
                items,
                panic_on: None,
                queried: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PartitionReader for ScriptedReader {
        async fn query_partition(&self, shard_id: &str) -> Result<Vec<Item>, StoreError> {
            self.queried
                .lock()
                .expect("poisoned mutex")
                .push(shard_id.to_string());
            if self.panic_on.as_deref() == Some(shard_id) {
                panic!("reader crashed on {shard_id}");
            }
            Ok(self
                .items
                .iter()
                .filter(|item| item.shard_id == shard_id)
                .cloned()
                .collect())
        }
    }

    #[tokio::test]
    async fn queries_every_shard_even_when_empty() {
        let reader = Arc::new(ScriptedReader::new(Vec::new()));

        let result = get_all_items(
            reader.clone(),
            "t1",
            ShardRange::default(),
            Duration::from_secs(1),
        )
        .await;

        assert!(result.groups.is_empty());
        assert!(result.is_complete());
        assert_eq!(result.shards_queried, 10);

        let queried: BTreeSet<String> = reader
            .queried
            .lock()
            .expect("poisoned mutex")
            .iter()
            .cloned()
            .collect();
        assert_eq!(
            queried,
            ShardRange::default()
                .shard_ids("t1")
                .into_iter()
                .collect::<BTreeSet<_>>()
        );
    }

    #[tokio::test]
    async fn groups_items_by_shard_and_drops_empty_shards() {
        let reader = Arc::new(ScriptedReader::new(vec![
            Item::new("t1-2", "10001", "a"),
            Item::new("t1-2", "10002", "b"),
            Item::new("t1-9", "10003", "c"),
            Item::new("t2-2", "10004", "other tenant"),
        ]));

        let mut result =
            get_all_items(reader, "t1", ShardRange::default(), Duration::from_secs(1)).await;
        result.groups.sort_by(|a, b| a.shard_id.cmp(&b.shard_id));

        assert_eq!(result.groups.len(), 2);
        assert_eq!(result.groups[0].shard_id, "t1-2");
        assert_eq!(result.groups[0].items.len(), 2);
        assert_eq!(result.groups[1].shard_id, "t1-9");
        assert_eq!(result.item_count(), 3);
        assert!(result
            .groups
            .iter()
            .all(|group| group.items.iter().all(|item| item.shard_id == group.shard_id)));
    }

    #[tokio::test]
    async fn panicking_shard_task_is_reported_not_propagated() {
        let mut reader = ScriptedReader::new(vec![Item::new("t1-1", "10001", "a")]);
        reader.panic_on = Some("t1-5".to_string());

        let result = get_all_items(
            Arc::new(reader),
            "t1",
            ShardRange::default(),
            Duration::from_secs(1),
        )
        .await;

        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].shard_id, "t1-5");
        assert!(result.failures[0].reason.contains("aborted"));
        assert!(matches!(
            result.partial_failure(),
            Some(ItemsError::PartialFailure {
                total_shards: 10,
                ..
            })
        ));
    }
}
