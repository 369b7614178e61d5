//! STAC item model.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::catalog::{require_conformance, TRANSACTION_CONFORMANCE};
use crate::models::collection::Asset;
use crate::models::link::{rel, Link};
use crate::models::{overlay, STAC_VERSION};
use crate::resource::Resource;
use crate::traits::{Linked, Update};
use crate::util::join_url;

/// A STAC item: a GeoJSON feature with assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Always `"Feature"`.
    #[serde(rename = "type", default)]
    pub object_type: Option<String>,

    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stac_version: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,

    /// GeoJSON geometry, `null` for items without a footprint.
    #[serde(default)]
    pub geometry: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    #[serde(default)]
    pub properties: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,

    #[serde(default)]
    pub links: Vec<Link>,

    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    /// The `datetime` property, if present and valid RFC 3339.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        self.properties
            .get("datetime")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl Linked for Item {
    const ENTITY: &'static str = "Item";

    fn links(&self) -> &[Link] {
        &self.links
    }

    /// Search results may omit the self link; the item URL is then derived
    /// from the collection link.
    fn self_href(&self) -> Result<String> {
        if let Some(link) = self.link(rel::SELF) {
            return Ok(link.href.clone());
        }
        let collection = self.href(rel::COLLECTION)?;
        join_url(collection, &["items", &*urlencoding::encode(&self.id)])
    }
}

/// Parameters for creating an item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub id: String,
    pub geometry: Option<Value>,
    pub bbox: Option<Vec<f64>>,
    /// Acquisition time, stored as the `datetime` property.
    pub datetime: Option<DateTime<Utc>>,
    pub properties: Map<String, Value>,
    pub assets: BTreeMap<String, Asset>,
}

impl NewItem {
    /// An item without geometry or properties.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            geometry: None,
            bbox: None,
            datetime: None,
            properties: Map::new(),
            assets: BTreeMap::new(),
        }
    }

    pub(crate) fn into_body(self, collection_id: &str) -> Result<Value> {
        let mut properties = self.properties;
        // STAC requires the key even when unknown
        let datetime = self
            .datetime
            .map(|dt| Value::String(dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)))
            .unwrap_or(Value::Null);
        properties.insert("datetime".to_string(), datetime);

        let item = Item {
            object_type: Some("Feature".to_string()),
            id: self.id,
            stac_version: Some(STAC_VERSION.to_string()),
            stac_extensions: Vec::new(),
            geometry: self.geometry,
            bbox: self.bbox,
            properties,
            collection: Some(collection_id.to_string()),
            assets: self.assets,
            links: Vec::new(),
            extra: Map::new(),
        };
        Ok(serde_json::to_value(item)?)
    }
}

/// Parameters for updating an item. Unset fields keep their value;
/// `properties` entries are merged into the existing properties.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub geometry: Option<Value>,
    pub bbox: Option<Vec<f64>>,
    pub datetime: Option<DateTime<Utc>>,
    pub properties: Map<String, Value>,
}

impl ItemUpdate {
    fn apply(self, item: &Item) -> Result<Value> {
        let mut properties = item.properties.clone();
        properties.extend(self.properties);
        if let Some(dt) = self.datetime {
            properties.insert(
                "datetime".to_string(),
                Value::String(dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
            );
        }

        let mut changes = Map::new();
        changes.insert("properties".to_string(), Value::Object(properties));
        if let Some(geometry) = self.geometry {
            changes.insert("geometry".to_string(), geometry);
        }
        if let Some(bbox) = self.bbox {
            changes.insert("bbox".to_string(), serde_json::to_value(bbox)?);
        }
        overlay(item, &changes)
    }
}

impl Resource<Item> {
    /// Delete this item.
    #[tracing::instrument(skip(self), fields(item = %self.id))]
    pub async fn delete(&self) -> Result<()> {
        require_conformance(self, &[TRANSACTION_CONFORMANCE]).await?;
        self.delete_self().await?;
        Ok(())
    }
}

#[async_trait]
impl Update for Item {
    type Params = ItemUpdate;

    #[tracing::instrument(skip(resource), fields(item = %resource.id))]
    async fn update(resource: &mut Resource<Self>, params: Self::Params) -> Result<()> {
        require_conformance(resource, &[TRANSACTION_CONFORMANCE]).await?;
        let body = params.apply(resource.data())?;
        resource.put_self(&body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> Item {
        serde_json::from_value(json!({
            "type": "Feature",
            "stac_version": "1.0.0",
            "id": "S2A_20230601",
            "geometry": {"type": "Point", "coordinates": [0.0, 51.5]},
            "bbox": [0.0, 51.5, 0.0, 51.5],
            "properties": {"datetime": "2023-06-01T10:30:00Z", "eo:cloud_cover": 12.5},
            "collection": "sentinel2_ard",
            "assets": {
                "thumbnail": {"href": "https://hub/thumb.png", "type": "image/png", "roles": ["thumbnail"]}
            },
            "links": [
                {"rel": "collection", "href": "https://hub/stac/collections/sentinel2_ard"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_item_deserialize() {
        let item = sample();
        assert_eq!(item.id, "S2A_20230601");
        assert_eq!(item.collection.as_deref(), Some("sentinel2_ard"));
        assert_eq!(item.assets["thumbnail"].roles, vec!["thumbnail"]);
        assert_eq!(
            item.datetime(),
            Some(Utc.with_ymd_and_hms(2023, 6, 1, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_self_href_falls_back_to_collection_link() {
        let item = sample();
        assert_eq!(
            item.self_href().unwrap(),
            "https://hub/stac/collections/sentinel2_ard/items/S2A_20230601"
        );

        let mut with_self = sample();
        with_self
            .links
            .push(Link::new("self", "https://hub/other/items/S2A_20230601"));
        assert_eq!(
            with_self.self_href().unwrap(),
            "https://hub/other/items/S2A_20230601"
        );
    }

    #[test]
    fn test_self_href_without_links_fails() {
        let mut item = sample();
        item.links.clear();
        assert!(item.self_href().is_err());
    }

    #[test]
    fn test_new_item_body() {
        let mut params = NewItem::new("item-1");
        params.datetime = Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        params
            .properties
            .insert("platform".into(), json!("sentinel-2a"));

        let body = params.into_body("col-1").unwrap();
        assert_eq!(body["id"], "item-1");
        assert_eq!(body["type"], "Feature");
        assert_eq!(body["collection"], "col-1");
        assert_eq!(body["properties"]["datetime"], "2024-01-02T03:04:05Z");
        assert_eq!(body["properties"]["platform"], "sentinel-2a");
        assert!(body["geometry"].is_null());
    }

    #[test]
    fn test_new_item_without_datetime_sends_null() {
        let body = NewItem::new("x").into_body("c").unwrap();
        assert!(body["properties"]["datetime"].is_null());
        assert!(body["properties"].get("datetime").is_some());
    }

    #[test]
    fn test_item_update_merges_properties() {
        let item = sample();
        let mut update = ItemUpdate::default();
        update.properties.insert("eo:cloud_cover".into(), json!(3.0));
        update.geometry = Some(json!({"type": "Point", "coordinates": [1.0, 52.0]}));

        let body = update.apply(&item).unwrap();
        assert_eq!(body["properties"]["eo:cloud_cover"], 3.0);
        assert_eq!(body["properties"]["datetime"], "2023-06-01T10:30:00Z");
        assert_eq!(body["geometry"]["coordinates"], json!([1.0, 52.0]));
        assert_eq!(body["id"], "S2A_20230601");
    }
}
