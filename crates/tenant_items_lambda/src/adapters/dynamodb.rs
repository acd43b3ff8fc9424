use std::collections::HashMap;
use std::time::SystemTime;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::config::{Credentials, Region};
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types::AttributeValue;
use tenant_items_core::contract::{
    Item, PARTITION_KEY_ATTRIBUTE, PAYLOAD_ATTRIBUTE, SORT_KEY_ATTRIBUTE,
};

use crate::adapters::credentials::ScopedSession;
use crate::adapters::item_store::{PartitionReader, ScopedItemTable, ScopedTableFactory};
use crate::error::StoreError;

const ACCESS_DENIED_CODE: &str = "AccessDeniedException";
const SCOPED_CREDENTIALS_PROVIDER: &str = "tenant-scoped-session";

/// Partition queries made with the function's own role.
pub struct DynamoPartitionReader {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl DynamoPartitionReader {
    pub fn new(client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl PartitionReader for DynamoPartitionReader {
    async fn query_partition(&self, shard_id: &str) -> Result<Vec<Item>, StoreError> {
        let mut items = Vec::new();
        let mut exclusive_start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression(format!("{PARTITION_KEY_ATTRIBUTE} = :partition_id"))
                .expression_attribute_values(
                    ":partition_id",
                    AttributeValue::S(shard_id.to_string()),
                )
                .set_exclusive_start_key(exclusive_start_key.take())
                .send()
                .await
                .map_err(|error| classify_sdk_error("Query", error))?;

            for attributes in output.items() {
                items.push(item_from_attributes(attributes)?);
            }

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(items)
    }
}

/// Builds a DynamoDB client per scoped session on top of the shared SDK
/// configuration, so retries and timeouts match the unscoped client.
pub struct DynamoTableFactory {
    sdk_config: SdkConfig,
    table_name: String,
}

impl DynamoTableFactory {
    pub fn new(sdk_config: SdkConfig, table_name: impl Into<String>) -> Self {
        Self {
            sdk_config,
            table_name: table_name.into(),
        }
    }
}

impl ScopedTableFactory for DynamoTableFactory {
    fn open(&self, session: &ScopedSession) -> Box<dyn ScopedItemTable> {
        let credentials = Credentials::new(
            session.credentials.access_key_id.clone(),
            session.credentials.secret_access_key.clone(),
            Some(session.credentials.session_token.clone()),
            Some(SystemTime::from(session.credentials.expires_at)),
            SCOPED_CREDENTIALS_PROVIDER,
        );
        let config = aws_sdk_dynamodb::config::Builder::from(&self.sdk_config)
            .region(Region::new(session.region.clone()))
            .credentials_provider(credentials)
            .build();

        Box::new(DynamoScopedTable {
            client: aws_sdk_dynamodb::Client::from_conf(config),
            table_name: self.table_name.clone(),
        })
    }
}

pub struct DynamoScopedTable {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

#[async_trait]
impl ScopedItemTable for DynamoScopedTable {
    async fn get_item(
        &self,
        shard_id: &str,
        product_id: &str,
    ) -> Result<Option<Item>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(PARTITION_KEY_ATTRIBUTE, AttributeValue::S(shard_id.to_string()))
            .key(SORT_KEY_ATTRIBUTE, AttributeValue::S(product_id.to_string()))
            .send()
            .await
            .map_err(|error| classify_sdk_error("GetItem", error))?;

        output.item().map(item_from_attributes).transpose()
    }

    async fn put_item(&self, item: &Item) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .item(PARTITION_KEY_ATTRIBUTE, AttributeValue::S(item.shard_id.clone()))
            .item(SORT_KEY_ATTRIBUTE, AttributeValue::S(item.product_id.clone()))
            .item(PAYLOAD_ATTRIBUTE, AttributeValue::S(item.payload.clone()))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| classify_sdk_error("PutItem", error))
    }
}

fn classify_sdk_error<E, R>(operation: &str, error: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = error
        .as_service_error()
        .and_then(|service_error| service_error.code())
        .map(str::to_string);
    let detail = format!("{operation} failed: {}", DisplayErrorContext(&error));

    match code.as_deref() {
        Some(ACCESS_DENIED_CODE) => StoreError::AccessDenied(detail),
        _ => StoreError::Backend(detail),
    }
}

pub fn item_from_attributes(
    attributes: &HashMap<String, AttributeValue>,
) -> Result<Item, StoreError> {
    let string_attribute = |name: &str| -> Result<String, StoreError> {
        match attributes.get(name) {
            Some(AttributeValue::S(value)) => Ok(value.clone()),
            Some(AttributeValue::N(value)) => Ok(value.clone()),
            Some(other) => Err(StoreError::MalformedItem(format!(
                "attribute {name} has unexpected type: {other:?}"
            ))),
            None => Err(StoreError::MalformedItem(format!(
                "attribute {name} is missing"
            ))),
        }
    };

    let payload = match attributes.get(PAYLOAD_ATTRIBUTE) {
        None => String::new(),
        Some(AttributeValue::S(value)) => value.clone(),
        Some(other) => format!("{other:?}"),
    };

    Ok(Item {
        shard_id: string_attribute(PARTITION_KEY_ATTRIBUTE)?,
        product_id: string_attribute(SORT_KEY_ATTRIBUTE)?,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attributes(pairs: &[(&str, AttributeValue)]) -> HashMap<String, AttributeValue> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn item_from_attributes_reads_table_columns() {
        let item = item_from_attributes(&attributes(&[
            ("ShardID", AttributeValue::S("t1-4".to_string())),
            ("ProductId", AttributeValue::S("10007".to_string())),
            ("data", AttributeValue::S("{sample data}".to_string())),
        ]))
        .expect("item should convert");

        assert_eq!(item, Item::new("t1-4", "10007", "{sample data}"));
    }

    #[test]
    fn item_from_attributes_tolerates_missing_payload() {
        let item = item_from_attributes(&attributes(&[
            ("ShardID", AttributeValue::S("t1-4".to_string())),
            ("ProductId", AttributeValue::N("10007".to_string())),
        ]))
        .expect("item should convert");

        assert_eq!(item.payload, "");
        assert_eq!(item.product_id, "10007");
    }

    #[test]
    fn item_from_attributes_rejects_missing_keys() {
        let error = item_from_attributes(&attributes(&[(
            "ProductId",
            AttributeValue::S("10007".to_string()),
        )]))
        .expect_err("partition key is missing");

        assert_eq!(
            error,
            StoreError::MalformedItem("attribute ShardID is missing".to_string())
        );
    }
}
