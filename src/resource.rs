//! Server documents bound to the client that fetched them.

use std::fmt;
use std::ops::Deref;

use reqwest::header::HeaderMap;
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};

use crate::client::EodhClient;
use crate::error::{EodhError, Result};
use crate::traits::Linked;

/// A snapshot of a server document plus the client used for follow-up calls.
///
/// `Resource<T>` dereferences to `T`, so fields of the document are read
/// directly (`collection.id`). Navigation and actions (`get_items`,
/// `execute`, `delete`, ...) are implemented on the concrete
/// `Resource<Collection>`, `Resource<Process>`, etc.
///
/// Serializing a resource serializes only the document.
#[derive(Clone)]
pub struct Resource<T> {
    client: EodhClient,
    headers: HeaderMap,
    data: T,
}

impl<T: fmt::Debug> fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

impl<T> Deref for Resource<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T: Serialize> Serialize for Resource<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

impl<T> Resource<T> {
    /// Wrap an already decoded document.
    pub fn new(client: EodhClient, headers: HeaderMap, data: T) -> Self {
        Self {
            client,
            headers,
            data,
        }
    }

    /// The client this resource issues requests with.
    pub fn client(&self) -> &EodhClient {
        &self.client
    }

    /// Headers of the response the snapshot came from.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The document.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Drop the client handle and keep the document.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Replace the snapshot.
    pub(crate) fn replace(&mut self, headers: HeaderMap, data: T) {
        self.headers = headers;
        self.data = data;
    }
}

impl<T: DeserializeOwned> Resource<T> {
    /// Decode a successful response body.
    pub async fn from_response(client: EodhClient, response: Response) -> Result<Self> {
        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(EodhError::HttpError)?;
        let data = serde_json::from_slice(&bytes)?;
        Ok(Self::new(client, headers, data))
    }

    /// GET `url` and decode the document.
    pub async fn fetch(client: &EodhClient, url: &str) -> Result<Self> {
        let response = client.get(url).await?;
        Self::from_response(client.clone(), response).await
    }
}

impl<T: Linked> Resource<T> {
    /// URL of the document itself.
    pub fn self_href(&self) -> Result<String> {
        self.data.self_href()
    }

    /// DELETE the document's self URL.
    pub(crate) async fn delete_self(&self) -> Result<Response> {
        let href = self.data.self_href()?;
        self.client.delete(&href).await
    }
}

impl<T: Linked + DeserializeOwned> Resource<T> {
    /// Fetch a fresh snapshot from the self link and replace this one.
    #[tracing::instrument(skip(self), fields(entity = T::ENTITY))]
    pub async fn refresh(&mut self) -> Result<()> {
        let href = self.data.self_href()?;
        let fresh = Self::fetch(&self.client, &href).await?;
        self.replace(fresh.headers, fresh.data);
        Ok(())
    }

    /// PUT `body` to the self URL and take the returned document as the new
    /// snapshot. Servers that answer without a document are re-read.
    pub(crate) async fn put_self<B: Serialize + ?Sized>(&mut self, body: &B) -> Result<()> {
        let href = self.data.self_href()?;
        let response = self.client.put(&href, body).await?;
        self.absorb(response).await
    }

    /// Take the document in `response` as the new snapshot, or refresh when
    /// the body is empty or not a document of this type.
    pub(crate) async fn absorb(&mut self, response: Response) -> Result<()> {
        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(EodhError::HttpError)?;
        match serde_json::from_slice::<T>(&bytes) {
            Ok(data) => {
                self.replace(headers, data);
                Ok(())
            }
            Err(_) => self.refresh().await,
        }
    }
}
