//! E2E tests using the mock EODH server.
//!
//! These tests exercise full workflows against the mock server,
//! testing realistic scenarios rather than individual endpoints.

#![cfg(feature = "test-server")]

use std::time::Duration;

use eodhapi::mock_server::{Fixtures, MockServer, MockState, DEFAULT_USERNAME, NESTED_CATALOG};
use eodhapi::{
    Auth, Catalog, CatalogUpdate, CwlSource, EodhClient, EodhError, Item, ItemUpdate, JobStatus,
    NewCatalog, NewCollection, NewItem, Resource, SearchParams, Update, CATALOGUE_PATH,
};
use serde_json::{json, Map};

fn client(server: &MockServer) -> EodhClient {
    EodhClient::new(server.url(), Auth::Bearer("test-token".to_string()))
        .unwrap()
        .with_username(DEFAULT_USERNAME)
}

// =============================================================================
// Server Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_server_starts_on_random_port() {
    let server1 = MockServer::start().await;
    let server2 = MockServer::start().await;

    assert_ne!(server1.url(), server2.url());

    server1.shutdown().await;
    server2.shutdown().await;
}

#[tokio::test]
async fn test_server_shutdown_is_clean() {
    let server = MockServer::start().await;
    let url = server.url().to_string();

    server.shutdown().await;

    let result = reqwest::Client::new()
        .get(format!("{}/health", url))
        .send()
        .await;
    assert!(result.is_err());
}

// =============================================================================
// Catalogue Workflow Tests
// =============================================================================

#[tokio::test]
async fn test_ping_and_conformance() {
    let server = MockServer::start().await;
    let catalogue = client(&server).resource_catalog().await.unwrap();

    assert_eq!(catalogue.ping().await.unwrap().as_deref(), Some("PONG"));
    let classes = catalogue.get_conformance().await.unwrap();
    assert!(classes.iter().any(|c| c.ends_with("/item-search")));

    server.shutdown().await;
}

#[tokio::test]
async fn test_browse_to_items_workflow() {
    let server = MockServer::start().await;
    let catalogue = client(&server).resource_catalog().await.unwrap();

    // Step 1: top-level catalogs
    let catalogs = catalogue.get_catalogs().await.unwrap();
    let ids: Vec<_> = catalogs.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["supported-datasets"]);

    // Step 2: nested catalog and its collection
    let catalog = catalogue.get_catalog(NESTED_CATALOG).await.unwrap();
    let collections = catalog.get_collections().await.unwrap();
    assert_eq!(collections.len(), 1);
    let collection = catalog.get_collection("cmip6").await.unwrap();

    // Step 3: walk every item across pages
    let mut items = collection.get_items().unwrap();
    let mut ids = Vec::new();
    while let Some(item) = items.next().await.unwrap() {
        ids.push(item.id.clone());
    }
    assert_eq!(ids.len(), 25);
    assert_eq!(ids[0], "cmip6-item-001");
    assert_eq!(ids[24], "cmip6-item-025");
    assert_eq!(items.total_count(), Some(25));
    assert_eq!(items.pages_fetched(), 3);

    // Step 4: single item
    let item = collection.get_item("cmip6-item-002").await.unwrap();
    assert_eq!(
        item.datetime().map(|d| d.to_rfc3339()),
        Some("2023-01-02T11:00:00+00:00".to_string())
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_search_pages_with_token() {
    let server = MockServer::start().await;
    let catalogue = client(&server).resource_catalog().await.unwrap();

    let params = SearchParams::new().collections(&["cmip6"]).limit(10);
    let mut results = catalogue.search(&params).unwrap();

    assert_eq!(results.get_limited().await.unwrap().len(), 10);
    let all = results.collect_all().await.unwrap();
    assert_eq!(all.len(), 25);

    // Results carry no self link; the URL comes from the collection link
    let href = all[0].self_href().unwrap();
    assert!(href.ends_with("/collections/cmip6/items/cmip6-item-001"));

    // Re-read through the derived URL
    let item = Resource::<Item>::fetch(all[0].client(), &href).await.unwrap();
    assert_eq!(item.id, "cmip6-item-001");

    server.shutdown().await;
}

#[tokio::test]
async fn test_search_within_catalog_by_bbox() {
    let server = MockServer::start().await;
    let catalogue = client(&server).resource_catalog().await.unwrap();
    let catalog = catalogue.get_catalog("supported-datasets").await.unwrap();

    let hits = catalog
        .search(&SearchParams::new().bbox(-2.995, 51.0, -2.975, 52.0))
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    let ids: Vec<_> = hits.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["sentinel2_ard-item-001", "sentinel2_ard-item-002"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_transactional_workflow() {
    let server = MockServer::start().await;
    let catalogue = client(&server).resource_catalog().await.unwrap();

    // Create a catalog, a collection inside it and an item
    let mut catalog = catalogue
        .create_catalog(NewCatalog {
            id: "my-catalog".to_string(),
            description: "Scratch space".to_string(),
            title: None,
        })
        .await
        .unwrap();

    let collection = catalog
        .create_collection(NewCollection::new("my-collection", "Test data"))
        .await
        .unwrap();
    assert_eq!(collection.license.as_deref(), Some("proprietary"));

    let mut new_item = NewItem::new("scene-1");
    new_item.geometry = Some(json!({"type": "Point", "coordinates": [0.1, 51.5]}));
    new_item.bbox = Some(vec![0.1, 51.5, 0.1, 51.5]);
    let mut item = collection.create_item(new_item).await.unwrap();
    assert_eq!(item.collection.as_deref(), Some("my-collection"));
    assert!(item.properties["datetime"].is_null());

    // Update catalog and item
    Catalog::update(
        &mut catalog,
        CatalogUpdate {
            title: Some("Mine".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(catalog.title.as_deref(), Some("Mine"));

    let mut properties = Map::new();
    properties.insert("eo:cloud_cover".to_string(), json!(3.0));
    Item::update(
        &mut item,
        ItemUpdate {
            properties,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(item.properties["eo:cloud_cover"], 3.0);
    assert!(item.properties.contains_key("datetime"));

    // Delete bottom-up
    item.delete().await.unwrap();
    assert!(collection.get_item("scene-1").await.unwrap_err().is_not_found());
    catalog.delete().await.unwrap();

    let state = server.state();
    let state = state.read().await;
    assert!(!state.catalogs.contains_key("my-catalog"));
    assert!(state.collections.keys().all(|(path, _)| path != "my-catalog"));

    drop(state);
    server.shutdown().await;
}

#[tokio::test]
async fn test_transactions_need_conformance() {
    let state = MockState::new()
        .with_catalog("plain", Fixtures::catalog("plain", "Plain"))
        .with_collection("plain", Fixtures::collection("col", "Col"));
    let server = MockServer::with_state(state).await;

    let catalogue = client(&server).resource_catalog().await.unwrap();
    let catalog = catalogue.get_catalog("plain").await.unwrap();

    let err = catalog
        .create_collection(NewCollection::new("new", "New"))
        .await
        .unwrap_err();
    assert!(matches!(err, EodhError::Conformance(_)));

    let collection = catalog.get_collection("col").await.unwrap();
    assert!(matches!(
        collection.create_item(NewItem::new("x")).await,
        Err(EodhError::Conformance(_))
    ));

    server.shutdown().await;
}

#[tokio::test]
async fn test_missing_catalog_is_not_found() {
    let server = MockServer::start().await;
    let client = client(&server);

    let err = client
        .resource_catalog()
        .await
        .unwrap()
        .get_catalog("supported-datasets/missing")
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    // Same endpoint through the raw client
    let raw = client.get(&format!("{CATALOGUE_PATH}catalogs/nope")).await;
    assert_eq!(raw.unwrap_err().status_code(), Some(404));

    server.shutdown().await;
}

// =============================================================================
// ADES Workflow Tests
// =============================================================================

#[tokio::test]
async fn test_deploy_execute_and_collect_results() {
    let server = MockServer::start().await;
    let ades = client(&server).ades().await.unwrap();

    // Step 1: deploy from a URL
    let process = ades
        .deploy_process(CwlSource::Url(
            "https://example.com/workflows/water-bodies.cwl".to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(process.id, "water-bodies");

    let ids: Vec<_> = ades
        .get_processes()
        .await
        .unwrap()
        .iter()
        .map(|p| p.id.clone())
        .collect();
    assert_eq!(ids, vec!["convert-url", "water-bodies"]);

    // Step 2: execute and wait
    let mut inputs = Map::new();
    inputs.insert("stac_items".to_string(), json!(["https://example.com/item"]));
    let mut job = process.execute(inputs).await.unwrap();
    assert_eq!(job.status, JobStatus::Accepted);

    let status = job
        .wait_until_finished(Duration::from_millis(1), 10)
        .await
        .unwrap();
    assert_eq!(status, JobStatus::Successful);
    assert_eq!(job.progress, Some(100));

    // Step 3: results
    let results = job.get_results().await.unwrap();
    assert!(results["converted"]["href"].as_str().is_some());

    // Step 4: the job shows up in the list and can be dismissed
    let jobs = ades.get_jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    let mut job = ades.get_job(&job.id).await.unwrap();
    job.delete().await.unwrap();
    assert_eq!(job.status, JobStatus::Dismissed);

    server.shutdown().await;
}

#[tokio::test]
async fn test_deploy_inline_yaml_and_update() {
    let server = MockServer::start().await;
    let ades = client(&server).ades().await.unwrap();

    let cwl = "cwlVersion: v1.0\n$graph:\n  - class: Workflow\n    id: resize\n    label: Resize\n    doc: Resize an image\n";
    let mut process = ades
        .deploy_process(CwlSource::Yaml(cwl.to_string()))
        .await
        .unwrap();
    assert_eq!(process.title.as_deref(), Some("Resize"));
    assert_eq!(process.version.as_deref(), Some("0.0.1"));

    // Deploying the same id again conflicts
    let err = ades
        .deploy_process(CwlSource::Yaml(cwl.to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(409));

    process
        .update(CwlSource::Yaml(cwl.replace("label: Resize", "label: Resize v2")))
        .await
        .unwrap();
    assert_eq!(process.title.as_deref(), Some("Resize v2"));
    assert_eq!(process.version.as_deref(), Some("0.0.2"));

    process.delete().await.unwrap();
    assert!(ades.get_process("resize").await.unwrap_err().is_not_found());

    server.shutdown().await;
}

#[tokio::test]
async fn test_execute_with_empty_inputs() {
    let server = MockServer::start().await;
    let ades = client(&server).ades().await.unwrap();
    let process = ades.get_process("convert-url").await.unwrap();

    let job = process.execute(Map::new()).await.unwrap();
    assert!(!job.is_finished());

    server.shutdown().await;
}

#[tokio::test]
async fn test_ades_of_other_user_is_not_found() {
    let server = MockServer::start().await;
    let other = EodhClient::new(server.url(), Auth::None)
        .unwrap()
        .with_username("someone-else");

    assert!(other.ades().await.unwrap_err().is_not_found());

    server.shutdown().await;
}

// =============================================================================
// Workspace and Auth Tests
// =============================================================================

#[tokio::test]
async fn test_upload_with_required_token() {
    let state = Fixtures::default_scenario().with_required_token("test-token");
    let server = MockServer::with_state(state).await;

    let workspace = client(&server)
        .workspace()
        .with_files_url(format!("{}/files", server.url()));
    workspace
        .upload_bytes(b"a,b\n1,2\n".to_vec(), "tables/data.csv", None)
        .await
        .unwrap();

    let state = server.state();
    let state = state.read().await;
    let upload = &state.uploads[&format!("{DEFAULT_USERNAME}/tables/data.csv")];
    assert_eq!(upload.content, b"a,b\n1,2\n");
    assert_eq!(upload.content_type.as_deref(), Some("application/octet-stream"));

    drop(state);
    server.shutdown().await;
}

#[tokio::test]
async fn test_wrong_token_is_rejected() {
    let state = Fixtures::default_scenario().with_required_token("right");
    let server = MockServer::with_state(state).await;

    // Reads stay public
    let catalogue = client(&server).resource_catalog().await.unwrap();
    assert!(catalogue.get_catalog(NESTED_CATALOG).await.is_ok());

    let err = client(&server).ades().await.unwrap_err();
    assert_eq!(err.status_code(), Some(401));

    server.shutdown().await;
}
