//! Mock EODH server for E2E testing.
//!
//! This module provides an in-memory server that simulates the hub's
//! resource catalogue, ADES and workspace file endpoints. Unlike wiremock,
//! which mocks single requests per test, this server keeps state across
//! requests, so whole workflows (create, update, execute, poll) can be
//! exercised against it.
//!
//! # Example
//!
//! ```ignore
//! use eodhapi::mock_server::MockServer;
//! use eodhapi::{Auth, EodhClient};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let client = EodhClient::new(server.url(), Auth::None).unwrap();
//!
//!     let catalogue = client.resource_catalog().await.unwrap();
//!     let catalog = catalogue.get_catalog("supported-datasets").await.unwrap();
//!     assert_eq!(catalog.id, "supported-datasets");
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::{Fixtures, DEFAULT_USERNAME, NESTED_CATALOG};
pub use server::MockServer;
pub use state::{MockState, Upload};
