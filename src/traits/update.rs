//! Update trait for modifying entities.

use async_trait::async_trait;

use crate::error::Result;
use crate::resource::Resource;

/// Update an existing entity in place.
///
/// Implement this trait for entity types that can be modified after
/// creation. On success the resource holds the snapshot returned by the
/// server.
///
/// # Example
///
/// ```ignore
/// use eodhapi::{Collection, CollectionUpdate, Update};
///
/// let mut collection = catalog.get_collection("cmip6").await?;
/// Collection::update(
///     &mut collection,
///     CollectionUpdate {
///         title: Some("CMIP6".to_string()),
///         ..Default::default()
///     },
/// )
/// .await?;
/// ```
#[async_trait]
pub trait Update: Sized {
    /// Parameters for the update.
    type Params: Send;

    /// Send the update and replace the snapshot held by `resource`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update or the request fails.
    async fn update(resource: &mut Resource<Self>, params: Self::Params) -> Result<()>;
}
