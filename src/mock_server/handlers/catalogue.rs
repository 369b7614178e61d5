//! STAC resource catalogue handlers.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{authorize, error, not_found, page_range, SharedState};
use crate::mock_server::state::{parent_of, MockState};
use crate::{catalog_path, rel, Catalog, Collection, Item, Link, SearchParams, PAGINATION_LIMIT};

const CATALOGUE_ID: &str = "eodh-resource-catalogue";

// =============================================================================
// Rendering
// =============================================================================

fn stac_root(base: &str) -> String {
    format!("{base}/api/catalogue/stac/")
}

fn catalog_href(base: &str, path: &str) -> String {
    if path.is_empty() {
        return stac_root(base);
    }
    format!("{}{}", stac_root(base), catalog_path(path).join("/"))
}

fn collection_href(base: &str, path: &str, id: &str) -> String {
    format!("{}/collections/{}", catalog_href(base, path), urlencoding::encode(id))
}

fn render_catalog(base: &str, path: &str, catalog: &Catalog) -> Value {
    let mut catalog = catalog.clone();
    catalog.links = vec![
        Link::new(rel::SELF, catalog_href(base, path)),
        Link::new(rel::ROOT, stac_root(base)),
        Link::new(rel::PARENT, catalog_href(base, parent_of(path))),
    ];
    json!(catalog)
}

fn render_collection(base: &str, path: &str, collection: &Collection) -> Value {
    let href = collection_href(base, path, &collection.id);
    let mut collection = collection.clone();
    collection.links = vec![
        Link::new(rel::SELF, href.clone()),
        Link::new(rel::ITEMS, format!("{href}/items")),
        Link::new(rel::ROOT, stac_root(base)),
        Link::new(rel::PARENT, catalog_href(base, path)),
    ];
    json!(collection)
}

/// Search results only carry the collection link, as some STAC servers do.
fn render_item(base: &str, path: &str, item: &Item, with_self: bool) -> Value {
    let collection_id = item.collection.clone().unwrap_or_default();
    let collection = collection_href(base, path, &collection_id);
    let mut item = item.clone();
    item.links = vec![
        Link::new(rel::COLLECTION, collection.clone()),
        Link::new(rel::ROOT, stac_root(base)),
    ];
    if with_self {
        item.links.insert(
            0,
            Link::new(rel::SELF, format!("{collection}/items/{}", urlencoding::encode(&item.id))),
        );
        item.links.push(Link::new(rel::PARENT, collection));
    }
    json!(item)
}

fn list_links(self_href: String, base: &str) -> Vec<Link> {
    vec![Link::new(rel::SELF, self_href), Link::new(rel::ROOT, stac_root(base))]
}

// =============================================================================
// Path dispatch
// =============================================================================

/// What a path below `/catalogs/` addresses.
#[derive(Debug, PartialEq, Eq)]
pub enum CatalogTarget {
    Catalog(String),
    Catalogs(String),
    Collections(String),
    Collection(String, String),
    Items(String, String),
    Item(String, String, String),
    Search(String),
}

/// Parse `a/catalogs/b/collections/c/items/d` and the shorter forms.
pub fn parse_catalog_target(rest: &str) -> Option<CatalogTarget> {
    let segments: Vec<String> = rest
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| urlencoding::decode(s).map(|d| d.into_owned()).unwrap_or_else(|_| s.to_string()))
        .collect();

    let mut path = segments.first()?.clone();
    let mut i = 1;
    loop {
        let remaining = &segments[i..];
        return match remaining {
            [] => Some(CatalogTarget::Catalog(path)),
            [c] if c == "catalogs" => Some(CatalogTarget::Catalogs(path)),
            [c, child, ..] if c == "catalogs" => {
                path = format!("{path}/{child}");
                i += 2;
                continue;
            }
            [s] if s == "search" => Some(CatalogTarget::Search(path)),
            [c] if c == "collections" => Some(CatalogTarget::Collections(path)),
            [c, id] if c == "collections" => Some(CatalogTarget::Collection(path, id.clone())),
            [c, id, it] if c == "collections" && it == "items" => {
                Some(CatalogTarget::Items(path, id.clone()))
            }
            [c, id, it, item] if c == "collections" && it == "items" => {
                Some(CatalogTarget::Item(path, id.clone(), item.clone()))
            }
            _ => None,
        };
    }
}

// =============================================================================
// Root endpoints
// =============================================================================

/// GET /api/catalogue/stac/
pub async fn landing_page(State(state): State<SharedState>) -> Response {
    let state = state.read().await;
    let base = &state.base_url;
    let root = stac_root(base);

    let mut search = Link::new("search", format!("{root}search"));
    search.method = Some("POST".to_string());

    Json(json!({
        "type": "Catalog",
        "id": CATALOGUE_ID,
        "title": "EODH resource catalogue",
        "description": "Searchable spatiotemporal metadata describing Earth Observation datasets",
        "stac_version": crate::STAC_VERSION,
        "conformsTo": state.conformance(),
        "links": [
            Link::new(rel::SELF, root.clone()),
            Link::new(rel::ROOT, root.clone()),
            Link::new(rel::DATA, format!("{root}collections")),
            Link::new("conformance", format!("{root}conformance")),
            search,
        ],
    }))
    .into_response()
}

/// GET /api/catalogue/stac/_mgmt/ping
pub async fn ping() -> Response {
    Json(json!({"message": "PONG"})).into_response()
}

/// GET /api/catalogue/stac/conformance
pub async fn conformance(State(state): State<SharedState>) -> Response {
    let state = state.read().await;
    Json(json!({"conformsTo": state.conformance()})).into_response()
}

/// GET /api/catalogue/stac/catalogs
pub async fn list_root_catalogs(State(state): State<SharedState>) -> Response {
    let state = state.read().await;
    list_catalogs(&state, "")
}

/// POST /api/catalogue/stac/catalogs
pub async fn create_root_catalog(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.write().await;
    if let Err(e) = authorize(&state, &headers) {
        return e;
    }
    create_catalog(&mut state, "", body)
}

/// GET /api/catalogue/stac/collections
pub async fn list_all_collections(State(state): State<SharedState>) -> Response {
    let state = state.read().await;
    let base = &state.base_url;
    let collections: Vec<Value> = state
        .collections
        .iter()
        .map(|((path, _), c)| render_collection(base, path, c))
        .collect();
    Json(json!({
        "collections": collections,
        "links": list_links(format!("{}collections", stac_root(base)), base),
    }))
    .into_response()
}

/// GET /api/catalogue/stac/collections/{id}
pub async fn get_root_collection(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Response {
    let state = state.read().await;
    match state.find_collection(&id) {
        Some((path, collection)) => {
            Json(render_collection(&state.base_url, path, collection)).into_response()
        }
        None => not_found(format!("Collection {id} not found")),
    }
}

/// POST /api/catalogue/stac/search
pub async fn root_search(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let state = state.read().await;
    search(&state, None, body)
}

// =============================================================================
// Nested endpoints
// =============================================================================

/// GET /api/catalogue/stac/catalogs/{path}
pub async fn get_catalog_path(
    State(state): State<SharedState>,
    Path(rest): Path<String>,
    Query(query): Query<ItemsQuery>,
) -> Response {
    let state = state.read().await;
    let base = &state.base_url;

    match parse_catalog_target(&rest) {
        Some(CatalogTarget::Catalog(path)) => match state.catalogs.get(&path) {
            Some(catalog) => Json(render_catalog(base, &path, catalog)).into_response(),
            None => not_found(format!("Catalog {path} not found")),
        },
        Some(CatalogTarget::Catalogs(path)) => list_catalogs(&state, &path),
        Some(CatalogTarget::Collections(path)) => {
            if !state.catalogs.contains_key(&path) {
                return not_found(format!("Catalog {path} not found"));
            }
            let collections: Vec<Value> = state
                .catalog_collections(&path)
                .into_iter()
                .map(|c| render_collection(base, &path, c))
                .collect();
            Json(json!({
                "collections": collections,
                "links": list_links(format!("{}/collections", catalog_href(base, &path)), base),
            }))
            .into_response()
        }
        Some(CatalogTarget::Collection(path, id)) => {
            match state.collections.get(&(path.clone(), id.clone())) {
                Some(c) => Json(render_collection(base, &path, c)).into_response(),
                None => not_found(format!("Collection {id} not found in {path}")),
            }
        }
        Some(CatalogTarget::Items(path, id)) => list_items(&state, &path, &id, query),
        Some(CatalogTarget::Item(path, col, item_id)) => {
            let item = state
                .items
                .get(&(path.clone(), col.clone()))
                .and_then(|items| items.iter().find(|i| i.id == item_id));
            match item {
                Some(item) => Json(render_item(base, &path, item, true)).into_response(),
                None => not_found(format!("Item {item_id} not found in {col}")),
            }
        }
        Some(CatalogTarget::Search(_)) => error(StatusCode::METHOD_NOT_ALLOWED, "Use POST"),
        None => not_found(format!("Unknown path {rest}")),
    }
}

/// POST /api/catalogue/stac/catalogs/{path}
pub async fn post_catalog_path(
    State(state): State<SharedState>,
    Path(rest): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let target = parse_catalog_target(&rest);

    if let Some(CatalogTarget::Search(path)) = target {
        let state = state.read().await;
        return search(&state, Some(&path), body);
    }

    let mut state = state.write().await;
    if let Err(e) = authorize(&state, &headers) {
        return e;
    }

    match target {
        Some(CatalogTarget::Catalogs(parent)) => create_catalog(&mut state, &parent, body),
        Some(CatalogTarget::Collections(path)) => {
            if !state.catalogs.contains_key(&path) {
                return not_found(format!("Catalog {path} not found"));
            }
            let collection: Collection = match serde_json::from_value(body) {
                Ok(c) => c,
                Err(e) => return error(StatusCode::BAD_REQUEST, e.to_string()),
            };
            if state.collections.contains_key(&(path.clone(), collection.id.clone())) {
                return error(StatusCode::CONFLICT, format!("Collection {} already exists", collection.id));
            }
            let rendered = render_collection(&state.base_url, &path, &collection);
            state.insert_collection(&path, collection);
            (StatusCode::CREATED, Json(rendered)).into_response()
        }
        Some(CatalogTarget::Items(path, col)) => {
            let mut item: Item = match serde_json::from_value(body) {
                Ok(i) => i,
                Err(e) => return error(StatusCode::BAD_REQUEST, e.to_string()),
            };
            let key = (path.clone(), col.clone());
            if !state.collections.contains_key(&key) {
                return not_found(format!("Collection {col} not found in {path}"));
            }
            item.collection = Some(col);
            let base = state.base_url.clone();
            let items = state.items.entry(key).or_default();
            if items.iter().any(|i| i.id == item.id) {
                return error(StatusCode::CONFLICT, format!("Item {} already exists", item.id));
            }
            let rendered = render_item(&base, &path, &item, true);
            items.push(item);
            (StatusCode::CREATED, Json(rendered)).into_response()
        }
        _ => error(StatusCode::METHOD_NOT_ALLOWED, format!("Cannot POST to {rest}")),
    }
}

/// PUT /api/catalogue/stac/catalogs/{path}
pub async fn put_catalog_path(
    State(state): State<SharedState>,
    Path(rest): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.write().await;
    if let Err(e) = authorize(&state, &headers) {
        return e;
    }
    let base = state.base_url.clone();

    match parse_catalog_target(&rest) {
        Some(CatalogTarget::Catalog(path)) => {
            let Some(existing) = state.catalogs.get_mut(&path) else {
                return not_found(format!("Catalog {path} not found"));
            };
            match serde_json::from_value::<Catalog>(body) {
                Ok(mut catalog) => {
                    catalog.id = existing.id.clone();
                    *existing = catalog;
                    Json(render_catalog(&base, &path, existing)).into_response()
                }
                Err(e) => error(StatusCode::BAD_REQUEST, e.to_string()),
            }
        }
        Some(CatalogTarget::Collection(path, id)) => {
            let Some(existing) = state.collections.get_mut(&(path.clone(), id.clone())) else {
                return not_found(format!("Collection {id} not found in {path}"));
            };
            match serde_json::from_value::<Collection>(body) {
                Ok(mut collection) => {
                    collection.id = id;
                    *existing = collection;
                    Json(render_collection(&base, &path, existing)).into_response()
                }
                Err(e) => error(StatusCode::BAD_REQUEST, e.to_string()),
            }
        }
        Some(CatalogTarget::Item(path, col, item_id)) => {
            let existing = state
                .items
                .get_mut(&(path.clone(), col.clone()))
                .and_then(|items| items.iter_mut().find(|i| i.id == item_id));
            let Some(existing) = existing else {
                return not_found(format!("Item {item_id} not found in {col}"));
            };
            match serde_json::from_value::<Item>(body) {
                Ok(mut item) => {
                    item.id = item_id;
                    item.collection = Some(col);
                    *existing = item;
                    Json(render_item(&base, &path, existing, true)).into_response()
                }
                Err(e) => error(StatusCode::BAD_REQUEST, e.to_string()),
            }
        }
        _ => error(StatusCode::METHOD_NOT_ALLOWED, format!("Cannot PUT to {rest}")),
    }
}

/// DELETE /api/catalogue/stac/catalogs/{path}
pub async fn delete_catalog_path(
    State(state): State<SharedState>,
    Path(rest): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.write().await;
    if let Err(e) = authorize(&state, &headers) {
        return e;
    }

    let removed = match parse_catalog_target(&rest) {
        Some(CatalogTarget::Catalog(path)) => state.remove_catalog(&path),
        Some(CatalogTarget::Collection(path, id)) => state.remove_collection(&path, &id),
        Some(CatalogTarget::Item(path, col, item_id)) => match state.items.get_mut(&(path, col)) {
            Some(items) => {
                let before = items.len();
                items.retain(|i| i.id != item_id);
                items.len() != before
            }
            None => false,
        },
        _ => return error(StatusCode::METHOD_NOT_ALLOWED, format!("Cannot DELETE {rest}")),
    };

    if removed {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(format!("Nothing to delete at {rest}"))
    }
}

// =============================================================================
// Shared
// =============================================================================

/// Query parameters for listing items.
#[derive(Debug, Default, Deserialize)]
pub struct ItemsQuery {
    pub limit: Option<usize>,
    pub page: Option<usize>,
}

fn list_catalogs(state: &MockState, parent: &str) -> Response {
    if !parent.is_empty() && !state.catalogs.contains_key(parent) {
        return not_found(format!("Catalog {parent} not found"));
    }
    let base = &state.base_url;
    let catalogs: Vec<Value> = state
        .child_catalogs(parent)
        .into_iter()
        .map(|(path, c)| render_catalog(base, path, c))
        .collect();
    let self_href = if parent.is_empty() {
        format!("{}catalogs", stac_root(base))
    } else {
        format!("{}/catalogs", catalog_href(base, parent))
    };
    Json(json!({"catalogs": catalogs, "links": list_links(self_href, base)})).into_response()
}

fn create_catalog(state: &mut MockState, parent: &str, body: Value) -> Response {
    if !parent.is_empty() && !state.catalogs.contains_key(parent) {
        return not_found(format!("Catalog {parent} not found"));
    }
    let catalog: Catalog = match serde_json::from_value(body) {
        Ok(c) => c,
        Err(e) => return error(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let path = if parent.is_empty() {
        catalog.id.clone()
    } else {
        format!("{parent}/{}", catalog.id)
    };
    if state.catalogs.contains_key(&path) {
        return error(StatusCode::CONFLICT, format!("Catalog {path} already exists"));
    }
    let rendered = render_catalog(&state.base_url, &path, &catalog);
    state.catalogs.insert(path, catalog);
    (StatusCode::CREATED, Json(rendered)).into_response()
}

fn list_items(state: &MockState, path: &str, collection_id: &str, query: ItemsQuery) -> Response {
    let Some(items) = state.items.get(&(path.to_string(), collection_id.to_string())) else {
        return not_found(format!("Collection {collection_id} not found in {path}"));
    };

    let base = &state.base_url;
    let limit = query.limit.unwrap_or(PAGINATION_LIMIT as usize);
    let page = query.page.unwrap_or(1);
    let (range, has_next) = page_range(items.len(), limit, page);
    let items_href = format!("{}/items", collection_href(base, path, collection_id));

    let features: Vec<Value> = items[range.clone()]
        .iter()
        .map(|i| render_item(base, path, i, true))
        .collect();

    let mut links = list_links(format!("{items_href}?limit={limit}&page={page}"), base);
    if has_next {
        links.push(Link::new(rel::NEXT, format!("{items_href}?limit={limit}&page={}", page + 1)));
    }

    Json(json!({
        "type": "FeatureCollection",
        "features": features,
        "links": links,
        "numberMatched": items.len(),
        "numberReturned": range.len(),
    }))
    .into_response()
}

/// Item search, paged with a `token` of the form `page:N` in POST next links.
fn search(state: &MockState, catalog_path: Option<&str>, body: Value) -> Response {
    let token_page = body
        .get("token")
        .and_then(Value::as_str)
        .and_then(|t| t.strip_prefix("page:"))
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(1);
    let params: SearchParams = match serde_json::from_value(body) {
        Ok(p) => p,
        Err(e) => return error(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let base = &state.base_url;
    let matches = state.search(catalog_path, &params);
    let (range, has_next) = page_range(matches.len(), params.limit as usize, token_page);

    let features: Vec<Value> = matches[range.clone()]
        .iter()
        .map(|(path, item)| render_item(base, path, item, false))
        .collect();

    let search_href = match catalog_path {
        Some(path) => format!("{}/search", catalog_href(base, path)),
        None => format!("{}search", stac_root(base)),
    };
    let mut links = list_links(search_href.clone(), base);
    if has_next {
        let mut next = Link::new(rel::NEXT, search_href);
        next.method = Some("POST".to_string());
        next.body = Some(json!({"token": format!("page:{}", token_page + 1)}));
        next.merge = Some(true);
        links.push(next);
    }

    Json(json!({
        "type": "FeatureCollection",
        "features": features,
        "links": links,
        "context": {
            "returned": range.len(),
            "limit": params.limit,
            "matched": matches.len(),
        },
    }))
    .into_response()
}
