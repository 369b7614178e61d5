//! Pagination over link-based EODH API responses.
//!
//! STAC and OGC endpoints page by returning a `next` link. A [`PaginatedList`]
//! follows those links lazily: nothing is fetched until the first element is
//! asked for, and each subsequent page is requested only once the already
//! fetched elements run out.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::EodhClient;
use crate::error::{EodhError, Result};
use crate::models::{rel, Link};
use crate::resource::Resource;

/// Default page size requested from list endpoints.
pub const PAGINATION_LIMIT: u32 = 10;

/// Default maximum number of pages a [`PaginatedList`] fetches.
pub const MAX_PAGES: u32 = 1000;

/// A page of results.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "T: Serialize")]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Total number of matching items across all pages (if reported).
    pub total: Option<u64>,
    /// Request for the following page, if any.
    #[serde(skip)]
    pub next: Option<PageRequest>,
}

impl<T> Page<T> {
    /// Whether there are more pages.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }

    /// Map the items to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            next: self.next,
        }
    }

    /// Returns true if this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns an iterator over the items in this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// The request that fetches one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// HTTP method (GET or POST).
    pub method: Method,
    /// Page URL, absolute or relative to the client base URL.
    pub href: String,
    /// Query parameters appended to `href`.
    pub query: Vec<(String, String)>,
    /// JSON body for POST requests.
    pub body: Option<Value>,
}

impl PageRequest {
    /// A GET request for `href`.
    pub fn get(href: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            href: href.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// A POST request for `href` with a JSON body.
    pub fn post(href: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            href: href.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Build the request following `link`, given the body of this one.
    ///
    /// POST links send their own body, merged over the previous body when
    /// `merge` is set; without a body the previous one is resent. GET links
    /// carry their parameters in the href.
    pub fn follow(&self, link: &Link) -> Self {
        if !link.is_post() {
            return Self::get(link.href.clone());
        }

        let body = match (&link.body, link.merge.unwrap_or(false), &self.body) {
            (Some(Value::Object(overlay)), true, Some(Value::Object(base))) => {
                let mut merged = base.clone();
                for (k, v) in overlay {
                    merged.insert(k.clone(), v.clone());
                }
                Value::Object(merged)
            }
            (Some(body), _, _) => body.clone(),
            (None, _, Some(previous)) => previous.clone(),
            (None, _, None) => Value::Object(Default::default()),
        };

        Self::post(link.href.clone(), body)
    }
}

/// Fetch one page and decode the elements under `list_key`.
///
/// When the response is a bare JSON array it is used as the element list.
/// `null` elements are skipped. The total is read from `context.matched` or
/// `numberMatched`.
#[tracing::instrument(skip(client), fields(href = %request.href))]
pub async fn fetch_page<T: DeserializeOwned>(
    client: &EodhClient,
    request: &PageRequest,
    list_key: &str,
) -> Result<Page<Resource<T>>> {
    let mut builder = client.request(request.method.clone(), &request.href)?;
    if !request.query.is_empty() {
        builder = builder.query(&request.query);
    }
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }

    let response = client.send(builder).await?;
    let headers = response.headers().clone();
    let bytes = response.bytes().await.map_err(EodhError::HttpError)?;
    let mut data: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    let next = data
        .get("links")
        .cloned()
        .map(serde_json::from_value::<Vec<Link>>)
        .transpose()?
        .and_then(|links| Link::find(&links, rel::NEXT).map(|l| request.follow(l)));

    let total = data
        .pointer("/context/matched")
        .or_else(|| data.get("numberMatched"))
        .and_then(Value::as_u64);

    let elements = match data.get_mut(list_key).map(Value::take) {
        Some(Value::Array(elements)) => elements,
        Some(_) => Vec::new(),
        None => match data {
            Value::Array(elements) => elements,
            _ => Vec::new(),
        },
    };

    let items = elements
        .into_iter()
        .filter(|e| !e.is_null())
        .map(|e| {
            let item = serde_json::from_value(e)?;
            Ok(Resource::new(client.clone(), headers.clone(), item))
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(count = items.len(), ?total, has_next = next.is_some(), "fetched page");

    Ok(Page { items, total, next })
}

/// A lazily fetched, link-paginated list of resources.
///
/// # Example
///
/// ```ignore
/// let mut items = collection.get_items()?;
/// while let Some(item) = items.next().await? {
///     println!("{}", item.id);
/// }
/// println!("matched: {:?}", items.total_count());
/// ```
pub struct PaginatedList<T> {
    client: EodhClient,
    list_key: String,
    next: Option<PageRequest>,
    elements: Vec<Resource<T>>,
    position: usize,
    total_count: Option<u64>,
    pages_fetched: u32,
    max_pages: u32,
    first_page_len: Option<usize>,
}

impl<T> std::fmt::Debug for PaginatedList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedList")
            .field("list_key", &self.list_key)
            .field("next", &self.next)
            .field("fetched", &self.elements.len())
            .field("pages_fetched", &self.pages_fetched)
            .field("max_pages", &self.max_pages)
            .field("total_count", &self.total_count)
            .finish()
    }
}

impl<T: DeserializeOwned> PaginatedList<T> {
    /// Create a list whose first page is fetched with `first`.
    pub fn new(client: EodhClient, first: PageRequest, list_key: impl Into<String>) -> Self {
        Self {
            client,
            list_key: list_key.into(),
            next: Some(first),
            elements: Vec::new(),
            position: 0,
            total_count: None,
            pages_fetched: 0,
            max_pages: MAX_PAGES,
            first_page_len: None,
        }
    }

    /// Stop after `max_pages` pages, whatever the server links to next.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Total number of matching items, known once a page reported it.
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Whether another page may be fetched.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Elements fetched so far, in order.
    pub fn fetched(&self) -> &[Resource<T>] {
        &self.elements
    }

    /// Fetch the next page, returning its elements.
    ///
    /// Returns `None` once the last page has been fetched.
    pub async fn next_page(&mut self) -> Result<Option<&[Resource<T>]>> {
        let Some(request) = self.next.take() else {
            return Ok(None);
        };
        if self.pages_fetched >= self.max_pages {
            tracing::warn!(
                "Reached pagination limit of {} pages, stopping",
                self.max_pages
            );
            return Ok(None);
        }

        let page = match fetch_page::<T>(&self.client, &request, &self.list_key).await {
            Ok(page) => page,
            Err(e) => {
                // Allow the caller to retry the same page
                self.next = Some(request);
                return Err(e);
            }
        };

        self.pages_fetched += 1;
        if page.total.is_some() {
            self.total_count = page.total;
        }
        // A next link pointing back at the same request would never end
        self.next = page.next.filter(|n| *n != request);

        let start = self.elements.len();
        self.elements.extend(page.items);
        self.first_page_len.get_or_insert(self.elements.len());
        Ok(Some(&self.elements[start..]))
    }

    /// Element at `index`, fetching pages until it is available.
    pub async fn get(&mut self, index: usize) -> Result<Option<&Resource<T>>> {
        while self.elements.len() <= index {
            if self.next_page().await?.is_none() {
                return Ok(None);
            }
        }
        Ok(self.elements.get(index))
    }

    /// The first page only.
    ///
    /// Elements already fetched are returned without another request.
    pub async fn get_limited(&mut self) -> Result<&[Resource<T>]> {
        if self.first_page_len.is_none() {
            self.next_page().await?;
        }
        let len = self.first_page_len.unwrap_or(0);
        Ok(&self.elements[..len])
    }

    /// Fetch every remaining page and return all elements.
    pub async fn collect_all(mut self) -> Result<Vec<Resource<T>>> {
        while self.next_page().await?.is_some() {}
        Ok(self.elements)
    }
}

impl<T: DeserializeOwned + Clone> PaginatedList<T> {
    /// Next element of the sequence, fetching the following page on demand.
    ///
    /// Every element is yielded exactly once, in server order.
    #[allow(clippy::should_implement_trait)]
    pub async fn next(&mut self) -> Result<Option<Resource<T>>> {
        while self.position >= self.elements.len() {
            if self.next_page().await?.is_none() {
                return Ok(None);
            }
        }
        let element = self.elements[self.position].clone();
        self.position += 1;
        Ok(Some(element))
    }

    /// Restart [`next`](Self::next) from the first element without refetching.
    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_has_more() {
        let page: Page<i32> = Page {
            items: vec![1, 2],
            total: Some(4),
            next: Some(PageRequest::get("https://example.com/items?page=2")),
        };
        assert!(page.has_more());

        let last: Page<i32> = Page {
            items: vec![3, 4],
            total: Some(4),
            next: None,
        };
        assert!(!last.has_more());
    }

    #[test]
    fn test_page_map() {
        let page = Page {
            items: vec![1, 2, 3],
            total: Some(3),
            next: None,
        };
        let mapped = page.map(|x| x * 2);
        assert_eq!(mapped.items, vec![2, 4, 6]);
        assert_eq!(mapped.total, Some(3));
    }

    #[test]
    fn test_follow_get_link_drops_query() {
        let first = PageRequest::get("https://example.com/items").with_query("limit", 10);
        let next = first.follow(&Link::new("next", "https://example.com/items?token=abc"));
        assert_eq!(next.method, Method::GET);
        assert_eq!(next.href, "https://example.com/items?token=abc");
        assert!(next.query.is_empty());
        assert!(next.body.is_none());
    }

    #[test]
    fn test_follow_post_link_merges_body() {
        let first = PageRequest::post(
            "https://example.com/search",
            json!({"limit": 5, "collections": ["c1"]}),
        );
        let mut link = Link::new("next", "https://example.com/search");
        link.method = Some("POST".to_string());
        link.body = Some(json!({"token": "next:abc"}));
        link.merge = Some(true);

        let next = first.follow(&link);
        assert_eq!(next.method, Method::POST);
        assert_eq!(
            next.body,
            Some(json!({"limit": 5, "collections": ["c1"], "token": "next:abc"}))
        );
    }

    #[test]
    fn test_follow_post_link_without_merge_replaces_body() {
        let first = PageRequest::post("https://example.com/search", json!({"limit": 5}));
        let mut link = Link::new("next", "https://example.com/search");
        link.method = Some("POST".to_string());
        link.body = Some(json!({"token": "t"}));

        assert_eq!(first.follow(&link).body, Some(json!({"token": "t"})));
    }

    #[test]
    fn test_follow_post_link_without_body_resends_previous() {
        let first = PageRequest::post("https://example.com/search", json!({"limit": 5}));
        let mut link = Link::new("next", "https://example.com/search?page=2");
        link.method = Some("POST".to_string());

        let next = first.follow(&link);
        assert_eq!(next.href, "https://example.com/search?page=2");
        assert_eq!(next.body, Some(json!({"limit": 5})));
    }
}
