//! EODH API client.
//!
//! Low-level HTTP client that handles authentication and raw requests, plus
//! the facade methods that open each sub-API (resource catalogue, ADES,
//! workspaces). Entity-specific operations live on [`Resource`] wrappers.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use url::Url;

use crate::error::{EodhError, Result};
use crate::models::{Ades, CatalogService};
use crate::resource::Resource;
use crate::util::is_absolute_url;
use crate::workspace::Workspace;

/// Default base URL of the hub.
pub const DEFAULT_API_URL: &str = "https://eodatahub.org.uk";
/// Path of the STAC resource catalogue, relative to the base URL.
pub const CATALOGUE_PATH: &str = "api/catalogue/stac/";
const USER_AGENT: &str = concat!("eodhapi/", env!("CARGO_PKG_VERSION"));

/// Deployment environment of the hub, used to build workspace URLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Production,
    Staging,
    Test,
}

impl Environment {
    /// Short name used in hostnames (`prod`, `staging`, `test`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "prod",
            Self::Staging => "staging",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = EodhError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "prod" | "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "test" => Ok(Self::Test),
            other => Err(EodhError::InvalidArgument(format!(
                "unknown environment '{other}', expected prod, staging or test"
            ))),
        }
    }
}

/// Credentials attached to every request.
#[derive(Clone, Default)]
pub enum Auth {
    /// Anonymous access (public catalogue endpoints only).
    #[default]
    None,
    /// `Authorization: Bearer <token>`, as issued by the workspace token API.
    Bearer(String),
    /// HTTP basic auth passthrough.
    Basic { username: String, password: String },
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bearer(_) => f.write_str("Bearer(..)"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

impl Auth {
    fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Self::None => builder,
            Self::Bearer(token) => builder.bearer_auth(token),
            Self::Basic { username, password } => builder.basic_auth(username, Some(password)),
        }
    }
}

/// Low-level EODH API client.
///
/// Handles authentication and HTTP requests. Every resource returned by the
/// library keeps a clone of the client for follow-up calls.
///
/// This struct is cheaply cloneable; clones reference the same underlying
/// connection pool.
///
/// # Example
///
/// ```no_run
/// use eodhapi::{Auth, EodhClient};
///
/// # async fn example() -> eodhapi::Result<()> {
/// // Create from environment variables
/// let client = EodhClient::from_env()?;
///
/// // Or configure manually
/// let client = EodhClient::new("https://eodatahub.org.uk", Auth::Bearer("token".into()))?
///     .with_username("my-user");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct EodhClient {
    http: Client,
    base_url: Arc<Url>,
    auth: Auth,
    username: Option<String>,
    environment: Environment,
}

impl fmt::Debug for EodhClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EodhClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

impl EodhClient {
    /// Create a client from environment variables.
    ///
    /// * `EODH_API_URL` - base URL (defaults to `https://eodatahub.org.uk`)
    /// * `EODH_USERNAME` - account name, needed for ADES and workspaces
    /// * `EODH_TOKEN` - API token, sent as a bearer token
    /// * `EODH_PASSWORD` - used for basic auth when no token is set
    /// * `EODH_ENVIRONMENT` - `prod`, `staging` or `test` (defaults to `prod`)
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or environment name is invalid.
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("EODH_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let username = env::var("EODH_USERNAME").ok().filter(|u| !u.is_empty());
        let token = env::var("EODH_TOKEN").ok().filter(|t| !t.is_empty());
        let password = env::var("EODH_PASSWORD").ok().filter(|p| !p.is_empty());

        let auth = match (token, username.clone(), password) {
            (Some(token), _, _) => Auth::Bearer(token),
            (None, Some(username), Some(password)) => Auth::Basic { username, password },
            _ => Auth::None,
        };

        let mut client = Self::new(&base_url, auth)?;
        client.username = username;
        if let Ok(environment) = env::var("EODH_ENVIRONMENT") {
            client.environment = environment.parse()?;
        }
        Ok(client)
    }

    /// Create a new client for `base_url` with the given credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn new(base_url: &str, auth: Auth) -> Result<Self> {
        // Ensure base URL ends with /
        let base_url_str = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        let base_url = Url::parse(&base_url_str)?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(EodhError::HttpError)?;

        Ok(Self {
            http,
            base_url: Arc::new(base_url),
            auth,
            username: None,
            environment: Environment::default(),
        })
    }

    /// Set the account name used for ADES and workspace URLs.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the deployment environment.
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Account name, if configured.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Deployment environment.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Whether a token is configured.
    pub fn has_token(&self) -> bool {
        matches!(self.auth, Auth::Bearer(_))
    }

    /// Open the STAC resource catalogue.
    ///
    /// Calls: `GET {base}/api/catalogue/stac/`
    #[tracing::instrument(skip(self))]
    pub async fn resource_catalog(&self) -> Result<Resource<CatalogService>> {
        let response = self.get(CATALOGUE_PATH).await?;
        Resource::from_response(self.clone(), response).await
    }

    /// Open the ADES of the configured user.
    ///
    /// Calls: `GET {base}/api/ades/{username}/ogc-api/`
    ///
    /// # Errors
    ///
    /// Returns [`EodhError::ConfigMissing`] if no username is configured.
    #[tracing::instrument(skip(self))]
    pub async fn ades(&self) -> Result<Resource<Ades>> {
        let username = self.username.as_deref().ok_or_else(|| {
            EodhError::ConfigMissing("a username is required to access the ADES".to_string())
        })?;
        let path = format!("api/ades/{}/ogc-api/", urlencoding::encode(username));
        let response = self.get(&path).await?;
        Resource::from_response(self.clone(), response).await
    }

    /// Handle for uploading files into workspaces.
    pub fn workspace(&self) -> Workspace {
        Workspace::new(self.clone())
    }

    /// Resolve `url` against the base URL unless it is already absolute.
    pub fn resolve(&self, url: &str) -> Result<Url> {
        if is_absolute_url(url) {
            Ok(Url::parse(url)?)
        } else {
            Ok(self.base_url.join(url.trim_start_matches('/'))?)
        }
    }

    /// Start a request with auth attached.
    pub fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let url = self.resolve(url)?;
        Ok(self.auth.apply(self.http.request(method, url)))
    }

    /// Send a prepared request and check its status.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(EodhError::HttpError)?;
        Self::check_response(response).await
    }

    /// Make a GET request.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.send(self.request(Method::GET, url)?).await
    }

    /// Make a GET request with query parameters.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_with_query<Q: Serialize + ?Sized>(
        &self,
        url: &str,
        query: &Q,
    ) -> Result<Response> {
        self.send(self.request(Method::GET, url)?.query(query)).await
    }

    /// Make a POST request with JSON body.
    #[tracing::instrument(skip(self, body))]
    pub async fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<Response> {
        self.send(self.request(Method::POST, url)?.json(body)).await
    }

    /// Make a PUT request with JSON body.
    #[tracing::instrument(skip(self, body))]
    pub async fn put<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<Response> {
        self.send(self.request(Method::PUT, url)?.json(body)).await
    }

    /// Make a DELETE request.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, url: &str) -> Result<Response> {
        self.send(self.request(Method::DELETE, url)?).await
    }

    /// Send a raw body with an explicit content type.
    #[tracing::instrument(skip(self, body), fields(len = body.len()))]
    pub async fn send_raw(
        &self,
        method: Method,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<Response> {
        let builder = self
            .request(method, url)?
            .header(CONTENT_TYPE, content_type)
            .body(body);
        self.send(builder).await
    }

    /// Check response status and convert errors.
    async fn check_response(response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        // Handle rate limiting
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(EodhError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let message = Self::extract_error_message(response, status).await;
        tracing::debug!(status = status.as_u16(), %message, "request failed");
        Err(EodhError::ApiError {
            message,
            status_code: Some(status.as_u16()),
        })
    }

    /// Extract error message from a failed response.
    async fn extract_error_message(response: Response, status: reqwest::StatusCode) -> String {
        let body = match response.text().await {
            Ok(b) => b,
            Err(_) => return format!("HTTP {status}"),
        };

        // OGC and STAC servers disagree on where the message lives
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
            for key in ["message", "detail", "description", "error"] {
                if let Some(msg) = json.get(key).and_then(|m| m.as_str()) {
                    return msg.to_string();
                }
            }
        }

        if body.is_empty() {
            format!("HTTP {status}")
        } else {
            body
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_debug() {
        let client =
            EodhClient::new("https://eodatahub.org.uk", Auth::Bearer("test-token".into())).unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("EodhClient"));
        assert!(debug.contains("base_url"));
        // Token should not be in debug output
        assert!(!debug.contains("test-token"));
    }

    #[test]
    fn test_basic_auth_debug_hides_password() {
        let auth = Auth::Basic {
            username: "user".into(),
            password: "hunter2".into(),
        };
        let debug = format!("{:?}", auth);
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client1 = EodhClient::new("https://eodatahub.org.uk/hub", Auth::None).unwrap();
        let client2 = EodhClient::new("https://eodatahub.org.uk/hub/", Auth::None).unwrap();
        assert_eq!(client1.base_url().as_str(), client2.base_url().as_str());
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let client = EodhClient::new("https://eodatahub.org.uk/hub", Auth::None).unwrap();
        assert_eq!(
            client.resolve(CATALOGUE_PATH).unwrap().as_str(),
            "https://eodatahub.org.uk/hub/api/catalogue/stac/"
        );
        assert_eq!(
            client.resolve("/api/x").unwrap().as_str(),
            "https://eodatahub.org.uk/hub/api/x"
        );
        assert_eq!(
            client.resolve("https://other.example.com/a").unwrap().as_str(),
            "https://other.example.com/a"
        );
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("STAGING".parse::<Environment>().unwrap(), Environment::Staging);
        assert_eq!(Environment::Test.to_string(), "test");
        assert!("moon".parse::<Environment>().is_err());
    }

    #[test]
    fn test_token_presence() {
        let anon = EodhClient::new(DEFAULT_API_URL, Auth::None).unwrap();
        assert!(!anon.has_token());
        let authed = EodhClient::new(DEFAULT_API_URL, Auth::Bearer("t".into())).unwrap();
        assert!(authed.has_token());
    }
}
