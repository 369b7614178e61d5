//! Test data fixtures for the mock server.
//!
//! Provides factory functions for creating realistic test data.

use std::collections::BTreeMap;

use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Map, Value};

use crate::{
    AdditionalParameters, Asset, Catalog, Collection, Extent, Item, Parameter, Process, Provider,
    SpatialExtent, TemporalExtent, STAC_VERSION,
};

use super::state::MockState;

/// Collection of fixture factories for test data.
pub struct Fixtures;

/// Account name of the default scenario.
pub const DEFAULT_USERNAME: &str = "test-user";
/// Path of the nested catalog in the default scenario.
pub const NESTED_CATALOG: &str = "supported-datasets/ceda-stac-fastapi";

impl Fixtures {
    // =========================================================================
    // Catalogue Fixtures
    // =========================================================================

    /// Create a catalog with no links.
    pub fn catalog(id: &str, title: &str) -> Catalog {
        Catalog {
            object_type: Some("Catalog".to_string()),
            id: id.to_string(),
            title: Some(title.to_string()),
            description: format!("{title} catalog"),
            stac_version: Some(STAC_VERSION.to_string()),
            stac_extensions: vec![],
            links: vec![],
            extra: Map::new(),
        }
    }

    /// Create a collection over the British Isles starting in 2023.
    pub fn collection(id: &str, title: &str) -> Collection {
        Collection {
            object_type: Some("Collection".to_string()),
            id: id.to_string(),
            title: Some(title.to_string()),
            description: format!("{title} collection"),
            stac_version: Some(STAC_VERSION.to_string()),
            stac_extensions: vec![],
            license: Some("proprietary".to_string()),
            keywords: vec!["earth-observation".to_string()],
            providers: vec![Provider {
                name: "EODH".to_string(),
                description: None,
                roles: vec!["host".to_string()],
                url: None,
            }],
            extent: Some(Extent {
                spatial: SpatialExtent {
                    bbox: vec![vec![-9.0, 49.4, 3.1, 61.3]],
                },
                temporal: TemporalExtent {
                    interval: vec![[Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).single(), None]],
                },
            }),
            summaries: None,
            assets: BTreeMap::new(),
            links: vec![],
            extra: Map::new(),
        }
    }

    /// Create `count` items for `collection_id`, one per day from 2023-01-01.
    ///
    /// IDs are `{collection_id}-item-001`, `{collection_id}-item-002`, ...
    pub fn items(collection_id: &str, count: usize) -> Vec<Item> {
        (1..=count)
            .map(|n| {
                let lon = -3.0 + (n as f64) * 0.01;
                let lat = 51.5;
                let day = Utc.with_ymd_and_hms(2023, 1, 1, 11, 0, 0).single()
                    .map(|d| d + Duration::days(n as i64 - 1));
                Self::item(
                    &format!("{collection_id}-item-{n:03}"),
                    collection_id,
                    [lon, lat],
                    day.map(|d| d.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
                )
            })
            .collect()
    }

    /// Create a point item.
    pub fn item(id: &str, collection_id: &str, [lon, lat]: [f64; 2], datetime: Option<String>) -> Item {
        let mut properties = Map::new();
        properties.insert(
            "datetime".to_string(),
            datetime.map(Value::String).unwrap_or(Value::Null),
        );
        properties.insert("eo:cloud_cover".to_string(), json!(12.5));

        let mut assets = BTreeMap::new();
        assets.insert(
            "data".to_string(),
            Asset {
                href: format!("https://data.example.com/{collection_id}/{id}.tif"),
                title: Some("Data".to_string()),
                description: None,
                media_type: Some("image/tiff; application=geotiff".to_string()),
                roles: vec!["data".to_string()],
                extra: Map::new(),
            },
        );

        Item {
            object_type: Some("Feature".to_string()),
            id: id.to_string(),
            stac_version: Some(STAC_VERSION.to_string()),
            stac_extensions: vec![],
            geometry: Some(json!({"type": "Point", "coordinates": [lon, lat]})),
            bbox: Some(vec![lon, lat, lon, lat]),
            properties,
            collection: Some(collection_id.to_string()),
            assets,
            links: vec![],
            extra: Map::new(),
        }
    }

    // =========================================================================
    // ADES Fixtures
    // =========================================================================

    /// Create a process that converts an image at a URL.
    pub fn process(id: &str, title: &str) -> Process {
        let mut inputs = Map::new();
        inputs.insert(
            "url".to_string(),
            json!({"title": "Image URL", "schema": {"type": "string"}}),
        );
        inputs.insert(
            "size".to_string(),
            json!({"title": "Output size", "schema": {"type": "string"}}),
        );
        let mut outputs = Map::new();
        outputs.insert(
            "converted".to_string(),
            json!({"title": "Converted image", "schema": {"type": "string", "format": "uri"}}),
        );

        Process {
            id: id.to_string(),
            title: Some(title.to_string()),
            description: Some(format!("{title} workflow")),
            version: Some("0.1.0".to_string()),
            mutable: Some(true),
            job_control_options: vec!["async-execute".to_string()],
            output_transmission: vec!["value".to_string(), "reference".to_string()],
            keywords: vec![],
            metadata: vec![],
            additional_parameters: AdditionalParameters {
                title: None,
                role: None,
                href: None,
                parameters: vec![Parameter {
                    name: "memory".to_string(),
                    value: vec![json!("2Gi")],
                }],
            },
            inputs,
            outputs,
            links: vec![],
            extra: Map::new(),
        }
    }

    /// Create a freshly deployed process with no declared inputs.
    pub fn deployed_process(id: &str) -> Process {
        let mut process = Self::process(id, id);
        process.description = None;
        process.inputs = Map::new();
        process.version = Some("0.0.1".to_string());
        process
    }

    // =========================================================================
    // Scenarios
    // =========================================================================

    /// The state served by [`MockServer::start`](super::MockServer::start).
    ///
    /// * catalogs `supported-datasets` and `supported-datasets/ceda-stac-fastapi`
    /// * collection `cmip6` with 25 items in the nested catalog
    /// * collection `sentinel2_ard` with 3 items in `supported-datasets`
    /// * process `convert-url` for user `test-user`
    /// * transaction extensions enabled
    pub fn default_scenario() -> MockState {
        MockState::new()
            .with_username(DEFAULT_USERNAME)
            .with_transactions()
            .with_catalog("supported-datasets", Self::catalog("supported-datasets", "Supported datasets"))
            .with_catalog(NESTED_CATALOG, Self::catalog("ceda-stac-fastapi", "CEDA"))
            .with_collection(NESTED_CATALOG, Self::collection("cmip6", "CMIP6"))
            .with_items(NESTED_CATALOG, "cmip6", Self::items("cmip6", 25))
            .with_collection("supported-datasets", Self::collection("sentinel2_ard", "Sentinel 2 ARD"))
            .with_items("supported-datasets", "sentinel2_ard", Self::items("sentinel2_ard", 3))
            .with_process(Self::process("convert-url", "Convert URL"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_are_numbered_in_order() {
        let items = Fixtures::items("c", 12);
        assert_eq!(items.len(), 12);
        assert_eq!(items[0].id, "c-item-001");
        assert_eq!(items[11].id, "c-item-012");
        assert_eq!(
            items[1].properties["datetime"],
            json!("2023-01-02T11:00:00Z")
        );
    }

    #[test]
    fn test_default_scenario() {
        let state = Fixtures::default_scenario();
        assert_eq!(state.catalogs.len(), 2);
        assert_eq!(state.catalog_collections(NESTED_CATALOG).len(), 1);
        assert!(state.processes.contains_key("convert-url"));
        assert!(state.transactions);
    }
}
