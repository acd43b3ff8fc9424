use std::sync::Arc;
use std::time::Duration;

use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tenant_items_core::contract::{
    stable_contract_json, OperationOutcome, ITEM_NOT_FOUND_MESSAGE,
};
use tenant_items_core::request::{route_request, ItemsRequest, Route};
use tenant_items_core::sharding::ShardRange;
use tracing::{info, warn};

use crate::adapters::credentials::RoleAssumer;
use crate::adapters::item_store::{PartitionReader, ScopedTableFactory};
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::handlers::accessor::{get_item, ItemLookup};
use crate::handlers::broker::CredentialBroker;
use crate::handlers::fan_out::get_all_items;
use crate::handlers::seeder::seed;

/// Every response, including failures, goes out with this transport status.
/// The business outcome is carried in the body text.
pub const TRANSPORT_STATUS_CODE: u16 = 200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

impl From<&OperationOutcome> for ApiGatewayResponse {
    fn from(outcome: &OperationOutcome) -> Self {
        Self {
            status_code: TRANSPORT_STATUS_CODE,
            headers: json!({"Content-Type": "text/plain; charset=utf-8"}),
            body: outcome.render_body(),
        }
    }
}

/// The `/items` resource: routes a request to a lookup, a fan-out listing or
/// a seed, and turns every outcome into a response envelope.
pub struct ItemsService {
    broker: CredentialBroker,
    reader: Arc<dyn PartitionReader>,
    tables: Arc<dyn ScopedTableFactory>,
    seed_items_per_request: usize,
    shard_range: ShardRange,
    shard_query_timeout: Duration,
}

impl ItemsService {
    pub fn new(
        config: &ServiceConfig,
        assumer: Arc<dyn RoleAssumer>,
        reader: Arc<dyn PartitionReader>,
        tables: Arc<dyn ScopedTableFactory>,
    ) -> Self {
        Self {
            broker: CredentialBroker::new(assumer, config),
            reader,
            tables,
            seed_items_per_request: config.seed_items_per_request,
            shard_range: config.shard_range,
            shard_query_timeout: config.shard_query_timeout,
        }
    }

    pub async fn handle_api_event(&self, event: &Value) -> ApiGatewayResponse {
        let outcome = match ItemsRequest::from_api_gateway_event(event) {
            Ok(request) => self.dispatch(&request).await,
            Err(error) => OperationOutcome::NotSupported(error.message().to_string()),
        };
        ApiGatewayResponse::from(&outcome)
    }

    pub async fn dispatch(&self, request: &ItemsRequest) -> OperationOutcome {
        let route = match route_request(request) {
            Ok(route) => route,
            Err(error) => {
                info!(
                    component = "dispatcher",
                    event = "request_not_supported",
                    method = %request.method,
                    reason = %error,
                );
                return OperationOutcome::NotSupported(error.message().to_string());
            }
        };

        let outcome = match &route {
            Route::GetItem {
                tenant_id,
                shard_id,
                product_id,
            } => self.lookup_item(tenant_id, shard_id, product_id).await,
            Route::ListItems { tenant_id } => self.list_items(tenant_id).await,
            Route::CreateItems { tenant_id } => self.create_items(tenant_id).await,
        };

        info!(
            component = "dispatcher",
            event = "request_completed",
            method = %request.method,
            status = outcome.status_tag(),
        );
        outcome
    }

    async fn lookup_item(
        &self,
        tenant_id: &str,
        shard_id: &str,
        product_id: &str,
    ) -> OperationOutcome {
        match self.scoped_lookup(tenant_id, shard_id, product_id).await {
            Ok(ItemLookup::Found(item)) => {
                OperationOutcome::LookupSucceeded(format!("\n{}", stable_contract_json(&item)))
            }
            Ok(ItemLookup::NotFound) => {
                OperationOutcome::LookupSucceeded(format!("\n{ITEM_NOT_FOUND_MESSAGE}"))
            }
            Err(error) => OperationOutcome::Failed(format!("\n{error}")),
        }
    }

    async fn scoped_lookup(
        &self,
        tenant_id: &str,
        shard_id: &str,
        product_id: &str,
    ) -> Result<ItemLookup> {
        let session = self.broker.scope_to_tenant(tenant_id).await?;
        let table = self.tables.open(&session);
        get_item(table.as_ref(), shard_id, product_id).await
    }

    async fn list_items(&self, tenant_id: &str) -> OperationOutcome {
        let result = get_all_items(
            Arc::clone(&self.reader),
            tenant_id,
            self.shard_range,
            self.shard_query_timeout,
        )
        .await;

        let listing = format!("Items : \n{}", stable_contract_json(&result.groups));
        match result.partial_failure() {
            None => OperationOutcome::Success(listing),
            Some(error) => OperationOutcome::Failed(format!("{error}\n{listing}")),
        }
    }

    async fn create_items(&self, tenant_id: &str) -> OperationOutcome {
        let mut rng = OsRng;
        match seed(
            &self.broker,
            self.tables.as_ref(),
            tenant_id,
            self.seed_items_per_request,
            self.shard_range,
            &mut rng,
        )
        .await
        {
            Ok(shard_ids) => OperationOutcome::Success(format!(
                "Items with these Shard Ids created : {}",
                shard_ids.join(",")
            )),
            Err(error) => {
                warn!(
                    component = "dispatcher",
                    event = "seed_failed",
                    tenant_id,
                    error = %error,
                );
                OperationOutcome::Failed(error.to_string())
            }
        }
    }
}
