//! Mock EODH server.
//!
//! Provides an axum-based HTTP server that simulates the hub's APIs.

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::Fixtures;
use super::handlers;
use super::state::MockState;

const STAC: &str = "/api/catalogue/stac";
const ADES: &str = "/api/ades/:user/ogc-api";

/// A mock EODH server for testing.
///
/// The server runs in the background; point an [`EodhClient`](crate::EodhClient)
/// at [`url`](Self::url) to use it.
pub struct MockServer {
    url: String,
    handle: JoinHandle<()>,
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a new mock server with [`Fixtures::default_scenario`].
    ///
    /// Binds an ephemeral local port and serves from a background task.
    pub async fn start() -> Self {
        Self::with_state(Fixtures::default_scenario()).await
    }

    /// Serve no catalogs, processes or jobs.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Serve `state`.
    ///
    /// Links in responses point at the bound address.
    pub async fn with_state(mut state: MockState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("mock server could not bind a local port");
        let addr = listener.local_addr().expect("bound listener has no address");
        let url = format!("http://{}", addr);

        state.base_url = url.clone();
        let shared_state = state.shared();
        let app = router(shared_state.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server stopped unexpectedly");
        });

        Self {
            url,
            handle,
            state: shared_state,
        }
    }

    /// Base URL to hand to [`EodhClient::new`](crate::EodhClient::new).
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Live state behind the handlers, writable mid-test.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Abort the server task and wait for it to end.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}

/// Build the router with all routes.
pub fn router(state: Arc<RwLock<MockState>>) -> Router {
    Router::new()
        // Resource catalogue
        .route(STAC, get(handlers::landing_page))
        .route(&format!("{STAC}/"), get(handlers::landing_page))
        .route(&format!("{STAC}/_mgmt/ping"), get(handlers::ping))
        .route(&format!("{STAC}/conformance"), get(handlers::conformance))
        .route(
            &format!("{STAC}/catalogs"),
            get(handlers::list_root_catalogs).post(handlers::create_root_catalog),
        )
        .route(
            &format!("{STAC}/catalogs/*rest"),
            get(handlers::get_catalog_path)
                .post(handlers::post_catalog_path)
                .put(handlers::put_catalog_path)
                .delete(handlers::delete_catalog_path),
        )
        .route(&format!("{STAC}/collections"), get(handlers::list_all_collections))
        .route(&format!("{STAC}/collections/:id"), get(handlers::get_root_collection))
        .route(&format!("{STAC}/search"), post(handlers::root_search))
        // ADES
        .route(ADES, get(handlers::ades_landing))
        .route(&format!("{ADES}/"), get(handlers::ades_landing))
        .route(
            &format!("{ADES}/processes"),
            get(handlers::list_processes).post(handlers::deploy_process),
        )
        .route(
            &format!("{ADES}/processes/:id"),
            get(handlers::get_process)
                .put(handlers::replace_process)
                .delete(handlers::undeploy_process),
        )
        .route(
            &format!("{ADES}/processes/:id/execution"),
            post(handlers::execute_process),
        )
        .route(&format!("{ADES}/jobs"), get(handlers::list_jobs))
        .route(
            &format!("{ADES}/jobs/:id"),
            get(handlers::get_job).delete(handlers::dismiss_job),
        )
        .route(&format!("{ADES}/jobs/:id/results"), get(handlers::job_results))
        // Workspace files
        .route("/files/*key", put(handlers::upload_file))
        // Health check
        .route("/health", get(health_check))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_server::NESTED_CATALOG;
    use crate::{Auth, EodhClient};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_server_starts_and_responds() {
        let server = MockServer::start().await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}/health", server.url()))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());
        assert_eq!(response.text().await.unwrap(), "ok");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_router_without_listener() {
        let app = router(MockState::new().shared());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/catalogue/stac/_mgmt/ping")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_catalog_with_eodh_client() {
        let server = MockServer::start().await;
        let client = EodhClient::new(server.url(), Auth::None).unwrap();

        let catalogue = client.resource_catalog().await.expect("Failed to open catalogue");
        let catalog = catalogue
            .get_catalog(NESTED_CATALOG)
            .await
            .expect("Failed to get catalog");

        assert_eq!(catalog.id, "ceda-stac-fastapi");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_empty_server() {
        let server = MockServer::start_empty().await;
        let client = EodhClient::new(server.url(), Auth::None).unwrap();

        let catalogue = client.resource_catalog().await.unwrap();
        let result = catalogue.get_catalog("nonexistent").await;

        assert!(result.unwrap_err().is_not_found());

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_custom_state() {
        let state = MockState::new().with_catalog("mine", Fixtures::catalog("mine", "My catalog"));

        let server = MockServer::with_state(state).await;
        let client = EodhClient::new(server.url(), Auth::None).unwrap();

        let catalog = client
            .resource_catalog()
            .await
            .unwrap()
            .get_catalog("mine")
            .await
            .expect("Failed to get catalog");

        assert_eq!(catalog.title.as_deref(), Some("My catalog"));

        server.shutdown().await;
    }
}
