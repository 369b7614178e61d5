//! STAC collection model.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::catalog::{require_conformance, COLLECTION_TRANSACTION_CONFORMANCE, TRANSACTION_CONFORMANCE};
use crate::models::item::{Item, NewItem};
use crate::models::link::{rel, Link};
use crate::models::{overlay, STAC_VERSION};
use crate::pagination::{PageRequest, PaginatedList, PAGINATION_LIMIT};
use crate::resource::Resource;
use crate::traits::{Linked, Update};
use crate::util::join_url;

/// Spatial extent: one or more bounding boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialExtent {
    pub bbox: Vec<Vec<f64>>,
}

/// Temporal extent: one or more `[start, end]` intervals, open ends as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalExtent {
    pub interval: Vec<[Option<DateTime<Utc>>; 2]>,
}

/// Spatial and temporal extent of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub spatial: SpatialExtent,
    pub temporal: TemporalExtent,
}

impl Extent {
    /// Extent covering the whole globe with an open time range.
    pub fn global() -> Self {
        Self {
            spatial: SpatialExtent {
                bbox: vec![vec![-180.0, -90.0, 180.0, 90.0]],
            },
            temporal: TemporalExtent {
                interval: vec![[None, None]],
            },
        }
    }
}

/// Organisation that produced, processed or hosts the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A downloadable file attached to a collection or item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A STAC collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// Always `"Collection"`.
    #[serde(rename = "type", default)]
    pub object_type: Option<String>,

    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stac_version: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<Provider>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summaries: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub assets: BTreeMap<String, Asset>,

    #[serde(default)]
    pub links: Vec<Link>,

    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Linked for Collection {
    const ENTITY: &'static str = "Collection";

    fn links(&self) -> &[Link] {
        &self.links
    }
}

/// Parameters for creating a collection.
#[derive(Debug, Clone)]
pub struct NewCollection {
    pub id: String,
    pub description: String,
    pub title: Option<String>,
    pub license: String,
    pub extent: Extent,
    pub keywords: Vec<String>,
}

impl NewCollection {
    /// A collection with a global extent and `proprietary` licence.
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            title: None,
            license: "proprietary".to_string(),
            extent: Extent::global(),
            keywords: Vec::new(),
        }
    }

    pub(crate) fn into_body(self) -> Result<Value> {
        let collection = Collection {
            object_type: Some("Collection".to_string()),
            id: self.id,
            title: self.title,
            description: self.description,
            stac_version: Some(STAC_VERSION.to_string()),
            stac_extensions: Vec::new(),
            license: Some(self.license),
            keywords: self.keywords,
            providers: Vec::new(),
            extent: Some(self.extent),
            summaries: None,
            assets: BTreeMap::new(),
            links: Vec::new(),
            extra: Map::new(),
        };
        Ok(serde_json::to_value(collection)?)
    }
}

/// Parameters for updating a collection. Unset fields keep their value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,
}

impl Resource<Collection> {
    /// URL of the items endpoint.
    pub fn items_href(&self) -> Result<String> {
        match self.link(rel::ITEMS) {
            Some(link) => Ok(link.href.clone()),
            None => join_url(&self.self_href()?, &["items"]),
        }
    }

    /// Items of this collection, fetched lazily page by page.
    ///
    /// Calls: `GET {collection}/items?limit=10`, then the `next` links.
    pub fn get_items(&self) -> Result<PaginatedList<Item>> {
        let first = PageRequest::get(self.items_href()?).with_query("limit", PAGINATION_LIMIT);
        Ok(PaginatedList::new(self.client().clone(), first, "features"))
    }

    /// An item by ID.
    ///
    /// Calls: `GET {collection}/items/{item_id}`
    #[tracing::instrument(skip(self), fields(collection = %self.id))]
    pub async fn get_item(&self, item_id: &str) -> Result<Resource<Item>> {
        let url = join_url(&self.items_href()?, &[&*urlencoding::encode(item_id)])?;
        Resource::fetch(self.client(), &url).await
    }

    /// Create an item in this collection.
    ///
    /// Calls: `POST {collection}/items`
    #[tracing::instrument(skip(self, params), fields(collection = %self.id, item = %params.id))]
    pub async fn create_item(&self, params: NewItem) -> Result<Resource<Item>> {
        require_conformance(self, &[TRANSACTION_CONFORMANCE]).await?;
        let body = params.into_body(&self.id)?;
        let response = self.client().post(&self.items_href()?, &body).await?;
        Resource::from_response(self.client().clone(), response).await
    }

    /// Delete this collection.
    #[tracing::instrument(skip(self), fields(collection = %self.id))]
    pub async fn delete(&self) -> Result<()> {
        require_conformance(
            self,
            &[TRANSACTION_CONFORMANCE, COLLECTION_TRANSACTION_CONFORMANCE],
        )
        .await?;
        self.delete_self().await?;
        Ok(())
    }
}

#[async_trait]
impl Update for Collection {
    type Params = CollectionUpdate;

    #[tracing::instrument(skip(resource), fields(collection = %resource.id))]
    async fn update(resource: &mut Resource<Self>, params: Self::Params) -> Result<()> {
        require_conformance(
            resource,
            &[TRANSACTION_CONFORMANCE, COLLECTION_TRANSACTION_CONFORMANCE],
        )
        .await?;
        let body = overlay(resource.data(), &params)?;
        resource.put_self(&body).await
    }
}
