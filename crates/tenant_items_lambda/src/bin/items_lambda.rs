use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tenant_items_lambda::adapters::dynamodb::{DynamoPartitionReader, DynamoTableFactory};
use tenant_items_lambda::adapters::sts::StsRoleAssumer;
use tenant_items_lambda::config::ServiceConfig;
use tenant_items_lambda::handlers::dispatcher::{ApiGatewayResponse, ItemsService};
use tenant_items_lambda::telemetry::init_tracing;
use tracing::info;

async fn build_service(config: &ServiceConfig) -> ItemsService {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .load()
        .await;

    let assumer = StsRoleAssumer::new(aws_sdk_sts::Client::new(&sdk_config));
    let reader = DynamoPartitionReader::new(
        aws_sdk_dynamodb::Client::new(&sdk_config),
        config.table_name.clone(),
    );
    let tables = DynamoTableFactory::new(sdk_config, config.table_name.clone());

    ItemsService::new(
        config,
        Arc::new(assumer),
        Arc::new(reader),
        Arc::new(tables),
    )
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServiceConfig::from_env()
        .map_err(|error| Error::from(format!("invalid configuration: {error}")))?;
    info!(
        component = "items_lambda",
        event = "cold_start",
        region = %config.region,
        table_name = %config.table_name,
        shard_count = config.shard_range.len(),
    );

    let service = Arc::new(build_service(&config).await);
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let service = Arc::clone(&service);
        async move {
            let response: ApiGatewayResponse = service.handle_api_event(&event.payload).await;
            Ok::<_, Error>(response)
        }
    }))
    .await
}
