//! EODH API client library.
//!
//! A Rust library for the Earth Observation Data Hub APIs: the STAC
//! resource catalogue, the ADES (OGC API Processes) and workspace file
//! uploads. Documents returned by the hub are wrapped in [`Resource`],
//! which keeps the client around so navigation reads naturally.
//!
//! # Quick Start
//!
//! ```no_run
//! use eodhapi::{EodhClient, SearchParams};
//!
//! #[tokio::main]
//! async fn main() -> eodhapi::Result<()> {
//!     // Create client from environment variables
//!     let client = EodhClient::from_env()?;
//!
//!     // Browse the catalogue
//!     let catalogue = client.resource_catalog().await?;
//!     let catalog = catalogue.get_catalog("supported-datasets/ceda-stac-fastapi").await?;
//!     let collection = catalog.get_collection("cmip6").await?;
//!
//!     let mut items = collection.get_items()?;
//!     while let Some(item) = items.next().await? {
//!         println!("{}", item.id);
//!     }
//!
//!     // Search across the catalogue
//!     let params = SearchParams::new().collections(&["cmip6"]).limit(5);
//!     let first_page = catalogue.search(&params)?.get_limited().await?.len();
//!     println!("First page holds {first_page} items");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`EodhClient`] handles auth and raw requests, and opens each sub-API.
//! - [`Resource<T>`] binds a document to the client. Operations live on the
//!   concrete wrappers (`Resource<Collection>::get_items`,
//!   `Resource<Process>::execute`, ...).
//! - [`Linked`] gives every document link lookup; [`Update`] is implemented
//!   by the STAC entities that can be modified.
//! - [`PaginatedList`] follows `next` links lazily.
//! - [`EodhClient::get_wmts`] and [`EodhClient::get_wms`] fetch the map
//!   service capabilities.
//!
//! # Configuration
//!
//! The client reads configuration from environment variables:
//!
//! - `EODH_API_URL` (optional) - Base URL (defaults to `https://eodatahub.org.uk`)
//! - `EODH_USERNAME` - Account name, needed for the ADES and workspaces
//! - `EODH_TOKEN` - API token
//! - `EODH_PASSWORD` - Basic auth password when no token is set
//! - `EODH_ENVIRONMENT` (optional) - `prod`, `staging` or `test`

pub mod cli;
mod client;
mod error;
mod maps;
#[cfg(feature = "test-server")]
pub mod mock_server;
mod models;
pub mod output;
mod pagination;
mod resource;
mod traits;
pub mod util;
mod workspace;

// Re-export core types
pub use client::{Auth, EodhClient, Environment, CATALOGUE_PATH, DEFAULT_API_URL};
pub use error::{EodhError, Result};
pub use maps::{Capabilities, MapService, WMS_PATH, WMTS_PATH};
pub use output::PrettyPrint;
pub use pagination::{fetch_page, Page, PageRequest, PaginatedList, MAX_PAGES, PAGINATION_LIMIT};
pub use resource::Resource;
pub use workspace::{s3_url, Workspace};

// Re-export traits
pub use traits::{Linked, Update};

// Re-export models
pub use models::{
    // Shared
    rel,
    Link,
    STAC_VERSION,
    // Catalogue types
    Asset,
    Catalog,
    CatalogService,
    CatalogUpdate,
    Collection,
    CollectionUpdate,
    Extent,
    Item,
    ItemUpdate,
    NewCatalog,
    NewCollection,
    NewItem,
    Provider,
    SpatialExtent,
    TemporalExtent,
    COLLECTION_TRANSACTION_CONFORMANCE,
    TRANSACTION_CONFORMANCE,
    // Search types
    FieldsFilter,
    FilterLang,
    SearchParams,
    SortDirection,
    SortField,
    // ADES types
    AdditionalParameters,
    Ades,
    CwlSource,
    CWL_YAML_MEDIA_TYPE,
    Job,
    JobStatus,
    Parameter,
    Process,
    ProcessMetadata,
};

// Re-export convenience functions
pub use models::{catalog_path, check_conforms_to, parse_query_expressions};
