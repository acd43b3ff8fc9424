mod support;

use std::time::Duration;

use serde_json::json;
use support::{
    create_request, created_shard_ids, list_request, lookup_request, memory_service, test_config,
};
use tenant_items_core::contract::{Item, ItemGroup, OperationOutcome, ITEM_NOT_FOUND_MESSAGE};
use tenant_items_core::request::UNSUPPORTED_PARAMETERS_MESSAGE;
use tenant_items_core::sharding::{shard_suffix, ShardRange};

fn listed_groups(message: &str) -> Vec<ItemGroup> {
    let json = message
        .split_once("Items : \n")
        .map(|(_, listing)| listing)
        .expect("listing marker");
    serde_json::from_str(json).expect("listing should be valid json")
}

#[tokio::test]
async fn seeded_items_are_listed_and_individually_readable() {
    let (backend, service) = memory_service(&test_config());

    let created = service.dispatch(&create_request("acme")).await;
    assert_eq!(created.status_tag(), "Success", "{created:?}");
    let shard_ids = created_shard_ids(created.message());
    assert_eq!(shard_ids.len(), 3);

    let listed = service.dispatch(&list_request("acme")).await;
    assert_eq!(listed.status_tag(), "Success", "{listed:?}");
    let groups = listed_groups(listed.message());
    let listed_items: Vec<Item> = groups.iter().flat_map(|group| group.items.clone()).collect();
    assert_eq!(listed_items.len(), backend.items().len());
    for shard_id in &shard_ids {
        assert!(groups.iter().any(|group| &group.shard_id == shard_id));
    }

    let first = &listed_items[0];
    let lookup = service
        .dispatch(&lookup_request("acme", &first.shard_id, &first.product_id))
        .await;
    assert_eq!(
        lookup,
        OperationOutcome::LookupSucceeded(format!(
            "\n{{\"ShardID\":\"{}\",\"ProductId\":\"{}\",\"data\":\"{{sample data}}\"}}",
            first.shard_id, first.product_id
        ))
    );
}

#[tokio::test]
async fn listing_an_unknown_tenant_is_an_empty_success() {
    let (_backend, service) = memory_service(&test_config());

    let outcome = service.dispatch(&list_request("nobody")).await;

    assert_eq!(outcome, OperationOutcome::Success("Items : \n[]".to_string()));
}

#[tokio::test]
async fn listing_never_leaks_other_tenants() {
    let (backend, service) = memory_service(&test_config());
    backend.insert_item(Item::new("t1-1", "10001", "mine"));
    backend.insert_item(Item::new("t10-1", "10002", "prefix neighbour"));
    backend.insert_item(Item::new("t2-1", "10003", "other"));

    let outcome = service.dispatch(&list_request("t1")).await;
    let groups = listed_groups(outcome.message());

    assert_eq!(
        groups,
        vec![ItemGroup {
            shard_id: "t1-1".to_string(),
            items: vec![Item::new("t1-1", "10001", "mine")],
        }]
    );
}

#[tokio::test]
async fn configured_shard_count_bounds_writes_and_reads() {
    let mut config = test_config();
    config.shard_range = ShardRange::with_shard_count(4).expect("valid shard count");
    config.seed_items_per_request = 20;
    let (backend, service) = memory_service(&config);

    let created = service.dispatch(&create_request("t1")).await;
    for shard_id in created_shard_ids(created.message()) {
        let suffix = shard_suffix(&shard_id, "t1").expect("tenant shard");
        assert!((1..=4).contains(&suffix), "{shard_id} outside 1..=4");
    }

    // Placed outside the configured range so it must not be listed.
    backend.insert_item(Item::new("t1-9", "10001", "stray"));

    let listed = service.dispatch(&list_request("t1")).await;
    let groups = listed_groups(listed.message());
    let listed_count: usize = groups.iter().map(|group| group.items.len()).sum();
    assert_eq!(listed_count, backend.items().len() - 1);
    assert!(groups.iter().all(|group| group.shard_id != "t1-9"));
}

#[tokio::test]
async fn failing_shard_reports_partial_results() {
    let (backend, service) = memory_service(&test_config());
    backend.insert_item(Item::new("t1-1", "10001", "a"));
    backend.insert_item(Item::new("t1-3", "10002", "b"));
    backend.fail_partition("t1-3", "ProvisionedThroughputExceededException");

    let outcome = service.dispatch(&list_request("t1")).await;

    assert_eq!(outcome.status_tag(), "Failed");
    assert!(outcome.message().starts_with("1 of 10 shard queries failed"));
    assert!(outcome.message().contains("t1-3"));
    let groups = listed_groups(outcome.message());
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].shard_id, "t1-1");
}

#[tokio::test]
async fn stalled_shard_times_out_instead_of_hanging() {
    let mut config = test_config();
    config.shard_query_timeout = Duration::from_millis(50);
    let (backend, service) = memory_service(&config);
    backend.insert_item(Item::new("t1-5", "10001", "a"));
    backend.delay_partition("t1-2", Duration::from_secs(30));

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        service.dispatch(&list_request("t1")),
    )
    .await
    .expect("fan-out should not wait for the stalled shard");

    assert_eq!(outcome.status_tag(), "Failed");
    assert!(outcome.message().contains("t1-2"));
    assert!(outcome.message().contains("timed out"));
    assert_eq!(listed_groups(outcome.message()).len(), 1);
}

#[tokio::test]
async fn cross_tenant_point_lookup_fails_without_data() {
    let (backend, service) = memory_service(&test_config());
    backend.insert_item(Item::new("t2-1", "10001", "secret"));

    let outcome = service
        .dispatch(&lookup_request("t1", "t2-1", "10001"))
        .await;

    assert_eq!(outcome.status_tag(), "Failed");
    assert!(outcome.message().contains("Access denied"));
    assert!(!outcome.message().contains("secret"));
}

#[tokio::test]
async fn missing_item_lookup_reports_not_found() {
    let (_backend, service) = memory_service(&test_config());

    let outcome = service
        .dispatch(&lookup_request("t1", "t1-1", "10001"))
        .await;

    assert_eq!(
        outcome,
        OperationOutcome::LookupSucceeded(format!("\n{ITEM_NOT_FOUND_MESSAGE}"))
    );
}

#[tokio::test]
async fn api_gateway_events_render_the_text_envelope() {
    let (backend, service) = memory_service(&test_config());
    backend.insert_item(Item::new("t1-2", "10001", "a"));

    let listed = service
        .handle_api_event(&json!({
            "httpMethod": "GET",
            "queryStringParameters": {"tenant_id": "t1"},
        }))
        .await;
    assert_eq!(listed.status_code, 200);
    assert_eq!(
        listed.body,
        concat!(
            "\nOperation Success. Items : \n",
            r#"[{"shard_id":"t1-2","items":[{"ShardID":"t1-2","ProductId":"10001","data":"a"}]}]"#,
            "\n\n"
        )
    );

    let unsupported = service
        .handle_api_event(&json!({
            "httpMethod": "GET",
            "queryStringParameters": {"tenant": "t1"},
        }))
        .await;
    assert_eq!(unsupported.status_code, 200);
    assert_eq!(
        unsupported.body,
        format!("\nOperation Not Supported. {UNSUPPORTED_PARAMETERS_MESSAGE}\n\n")
    );

    let serialized = serde_json::to_value(&unsupported).expect("response should serialize");
    assert_eq!(serialized["statusCode"], 200);
}

#[tokio::test]
async fn rejected_credentials_fail_writes_but_not_listings() {
    let (backend, service) = memory_service(&test_config());
    backend.reject_role_assumption("AccessDenied: base role is not assumable");

    let created = service.dispatch(&create_request("t1")).await;
    assert_eq!(created.status_tag(), "Failed");
    assert!(created.message().contains("base role is not assumable"));
    assert!(backend.items().is_empty());

    let listed = service.dispatch(&list_request("t1")).await;
    assert_eq!(listed.status_tag(), "Success");
}
