//! STAC catalogue root and catalog models.
//!
//! The resource catalogue is a STAC API whose root ([`CatalogService`])
//! lists nested [`Catalog`]s. Catalogs hold collections, collections hold
//! items.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::{EodhClient, CATALOGUE_PATH};
use crate::error::{EodhError, Result};
use crate::models::collection::{Collection, NewCollection};
use crate::models::item::Item;
use crate::models::link::{rel, Link};
use crate::models::search::SearchParams;
use crate::models::{overlay, STAC_VERSION};
use crate::pagination::{PageRequest, PaginatedList};
use crate::resource::Resource;
use crate::traits::{Linked, Update};
use crate::util::join_url;

/// Conformance class of the STAC transaction extension for items.
pub const TRANSACTION_CONFORMANCE: &str =
    "https://api.stacspec.org/v1.0.0/ogcapi-features/extensions/transaction";

/// Conformance class of the STAC transaction extension for collections.
pub const COLLECTION_TRANSACTION_CONFORMANCE: &str =
    "https://api.stacspec.org/v1.0.0/collections/extensions/transaction";

/// Root document of the resource catalogue (STAC API landing page).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogService {
    /// Always `"Catalog"`.
    #[serde(rename = "type", default)]
    pub object_type: Option<String>,

    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "stac_version", default, skip_serializing_if = "Option::is_none")]
    pub stac_version: Option<String>,

    /// Conformance classes advertised on the landing page.
    #[serde(default)]
    pub conforms_to: Vec<String>,

    #[serde(default)]
    pub links: Vec<Link>,

    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Linked for CatalogService {
    const ENTITY: &'static str = "CatalogService";

    fn links(&self) -> &[Link] {
        &self.links
    }
}

/// A STAC catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Always `"Catalog"`.
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

    #[serde(default)]
    pub links: Vec<Link>,

    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Linked for Catalog {
    const ENTITY: &'static str = "Catalog";

    fn links(&self) -> &[Link] {
        &self.links
    }
}

/// Parameters for creating a catalog.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewCatalog {
    pub id: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Parameters for updating a catalog. Unset fields keep their value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// URL path of a catalog ID, where `a/b` names catalog `b` nested in `a`.
///
/// `"a/b"` becomes `["catalogs", "a", "catalogs", "b"]`.
pub fn catalog_path(catalog_id: &str) -> Vec<String> {
    catalog_id
        .split('/')
        .filter(|s| !s.is_empty())
        .flat_map(|s| ["catalogs".to_string(), urlencoding::encode(s).into_owned()])
        .collect()
}

/// Fail with [`EodhError::Conformance`] unless every `required` class is in
/// `conforms_to`.
pub fn check_conforms_to(conforms_to: &[String], required: &[&str]) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|uri| !conforms_to.iter().any(|c| c == *uri))
        .map(|uri| uri.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(EodhError::Conformance(missing))
    }
}

/// Conformance classes of the API root at `root_href`.
async fn fetch_conformance(client: &EodhClient, root_href: &str) -> Result<Vec<String>> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct ConformanceResponse {
        #[serde(default)]
        conforms_to: Vec<String>,
    }

    let url = join_url(root_href, &["conformance"])?;
    let response = client.get(&url).await?;
    let data: ConformanceResponse = response.json().await.map_err(EodhError::HttpError)?;
    Ok(data.conforms_to)
}

/// Check the conformance of the API that `resource` belongs to.
///
/// The API root is taken from the `root` link, falling back to the
/// catalogue path under the client base URL.
pub(crate) async fn require_conformance<T: Linked>(
    resource: &Resource<T>,
    required: &[&str],
) -> Result<()> {
    let root = match resource.link(rel::ROOT) {
        Some(link) => link.href.clone(),
        None => resource.client().resolve(CATALOGUE_PATH)?.to_string(),
    };
    let conforms_to = fetch_conformance(resource.client(), &root).await?;
    check_conforms_to(&conforms_to, required)
}

/// Request body for a new catalog.
fn new_catalog_body(params: &NewCatalog) -> Result<Value> {
    let mut body = serde_json::to_value(params)?;
    if let Value::Object(map) = &mut body {
        map.insert("type".to_string(), Value::from("Catalog"));
        map.insert("stac_version".to_string(), Value::from(STAC_VERSION));
        map.insert("links".to_string(), Value::Array(Vec::new()));
    }
    Ok(body)
}

async fn get_all<T: serde::de::DeserializeOwned>(
    client: &EodhClient,
    href: String,
    list_key: &str,
) -> Result<Vec<Resource<T>>> {
    PaginatedList::new(client.clone(), PageRequest::get(href), list_key)
        .collect_all()
        .await
}

fn search_list(client: &EodhClient, search_href: String, params: &SearchParams) -> Result<PaginatedList<Item>> {
    let body = serde_json::to_value(params)?;
    Ok(PaginatedList::new(
        client.clone(),
        PageRequest::post(search_href, body),
        "features",
    ))
}

impl Resource<CatalogService> {
    /// Health check of the catalogue.
    ///
    /// Calls: `GET /_mgmt/ping`, returns the `message` field.
    #[tracing::instrument(skip(self))]
    pub async fn ping(&self) -> Result<Option<String>> {
        let url = join_url(&self.self_href()?, &["_mgmt/ping"])?;
        let response = self.client().get(&url).await?;
        let data: Value = response.json().await.map_err(EodhError::HttpError)?;
        Ok(data.get("message").and_then(Value::as_str).map(str::to_string))
    }

    /// Conformance classes of the catalogue.
    ///
    /// Calls: `GET /conformance`
    #[tracing::instrument(skip(self))]
    pub async fn get_conformance(&self) -> Result<Vec<String>> {
        fetch_conformance(self.client(), &self.self_href()?).await
    }

    /// Fail unless the catalogue conforms to every class in `required`.
    pub async fn check_conforms_to(&self, required: &[&str]) -> Result<()> {
        check_conforms_to(&self.get_conformance().await?, required)
    }

    /// Top-level catalogs.
    ///
    /// Calls: `GET /catalogs`
    #[tracing::instrument(skip(self))]
    pub async fn get_catalogs(&self) -> Result<Vec<Resource<Catalog>>> {
        let href = join_url(&self.self_href()?, &["catalogs"])?;
        get_all(self.client(), href, "catalogs").await
    }

    /// A catalog by ID; `a/b` addresses catalog `b` nested in catalog `a`.
    ///
    /// Calls: `GET /catalogs/{a}/catalogs/{b}`
    #[tracing::instrument(skip(self))]
    pub async fn get_catalog(&self, catalog_id: &str) -> Result<Resource<Catalog>> {
        let url = join_url(&self.self_href()?, &catalog_path(catalog_id))?;
        Resource::fetch(self.client(), &url).await
    }

    /// Create a top-level catalog.
    ///
    /// Calls: `POST /catalogs`
    ///
    /// # Errors
    ///
    /// Returns [`EodhError::Conformance`] if the API does not support
    /// transactions.
    #[tracing::instrument(skip(self))]
    pub async fn create_catalog(&self, params: NewCatalog) -> Result<Resource<Catalog>> {
        self.check_conforms_to(&[TRANSACTION_CONFORMANCE, COLLECTION_TRANSACTION_CONFORMANCE])
            .await?;
        let url = join_url(&self.self_href()?, &["catalogs"])?;
        let response = self.client().post(&url, &new_catalog_body(&params)?).await?;
        Resource::from_response(self.client().clone(), response).await
    }

    /// URL of the collections endpoint (the `data` link).
    pub fn collections_href(&self) -> Result<String> {
        match self.link(rel::DATA) {
            Some(link) => Ok(link.href.clone()),
            None => join_url(&self.self_href()?, &["collections"]),
        }
    }

    /// All collections exposed at the root.
    ///
    /// Calls: `GET /collections`
    #[tracing::instrument(skip(self))]
    pub async fn get_collections(&self) -> Result<Vec<Resource<Collection>>> {
        get_all(self.client(), self.collections_href()?, "collections").await
    }

    /// A collection by ID.
    ///
    /// Calls: `GET /collections/{collection_id}`
    #[tracing::instrument(skip(self))]
    pub async fn get_collection(&self, collection_id: &str) -> Result<Resource<Collection>> {
        let url = join_url(&self.collections_href()?, &[&*urlencoding::encode(collection_id)])?;
        Resource::fetch(self.client(), &url).await
    }

    /// Search items across the catalogue.
    ///
    /// Calls: `POST /search`; further pages follow the `next` links.
    pub fn search(&self, params: &SearchParams) -> Result<PaginatedList<Item>> {
        search_list(self.client(), join_url(&self.self_href()?, &["search"])?, params)
    }
}

impl Resource<Catalog> {
    /// Child catalogs.
    ///
    /// Calls: `GET {catalog}/catalogs`
    #[tracing::instrument(skip(self), fields(catalog = %self.id))]
    pub async fn get_catalogs(&self) -> Result<Vec<Resource<Catalog>>> {
        let href = join_url(&self.self_href()?, &["catalogs"])?;
        get_all(self.client(), href, "catalogs").await
    }

    /// A nested catalog by ID, relative to this one.
    #[tracing::instrument(skip(self), fields(catalog = %self.id))]
    pub async fn get_catalog(&self, catalog_id: &str) -> Result<Resource<Catalog>> {
        let url = join_url(&self.self_href()?, &catalog_path(catalog_id))?;
        Resource::fetch(self.client(), &url).await
    }

    /// URL of this catalog's collections endpoint.
    pub fn collections_href(&self) -> Result<String> {
        join_url(&self.self_href()?, &["collections"])
    }

    /// Collections of this catalog.
    ///
    /// Calls: `GET {catalog}/collections`
    #[tracing::instrument(skip(self), fields(catalog = %self.id))]
    pub async fn get_collections(&self) -> Result<Vec<Resource<Collection>>> {
        get_all(self.client(), self.collections_href()?, "collections").await
    }

    /// A collection of this catalog.
    ///
    /// Calls: `GET {catalog}/collections/{collection_id}`
    #[tracing::instrument(skip(self), fields(catalog = %self.id))]
    pub async fn get_collection(&self, collection_id: &str) -> Result<Resource<Collection>> {
        let url = join_url(&self.collections_href()?, &[&*urlencoding::encode(collection_id)])?;
        Resource::fetch(self.client(), &url).await
    }

    /// Create a collection in this catalog.
    ///
    /// Calls: `POST {catalog}/collections`
    #[tracing::instrument(skip(self, params), fields(catalog = %self.id, collection = %params.id))]
    pub async fn create_collection(&self, params: NewCollection) -> Result<Resource<Collection>> {
        require_conformance(
            self,
            &[TRANSACTION_CONFORMANCE, COLLECTION_TRANSACTION_CONFORMANCE],
        )
        .await?;
        let response = self
            .client()
            .post(&self.collections_href()?, &params.into_body()?)
            .await?;
        Resource::from_response(self.client().clone(), response).await
    }

    /// Search items within this catalog.
    ///
    /// Calls: `POST {catalog}/search`
    pub fn search(&self, params: &SearchParams) -> Result<PaginatedList<Item>> {
        search_list(self.client(), join_url(&self.self_href()?, &["search"])?, params)
    }

    /// Delete this catalog.
    #[tracing::instrument(skip(self), fields(catalog = %self.id))]
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
impl Update for Catalog {
    type Params = CatalogUpdate;

    #[tracing::instrument(skip(resource), fields(catalog = %resource.id))]
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
