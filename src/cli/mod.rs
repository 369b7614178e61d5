//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the eodhapi binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{Auth, EodhClient, EodhError, Environment, MapService, Result, DEFAULT_API_URL};

/// EODH API command-line interface.
#[derive(Parser, Debug)]
#[command(name = "eodhapi", about = "Earth Observation Data Hub CLI", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Hub address and credentials.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Base URL of the hub.
    #[arg(long = "url", env = "EODH_API_URL", global = true, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Account name, needed for the ADES and workspaces.
    #[arg(long, env = "EODH_USERNAME", global = true)]
    pub username: Option<String>,

    /// API token.
    #[arg(long, env = "EODH_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Password for basic auth, used when no token is given.
    #[arg(long, env = "EODH_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Deployment environment (prod, staging or test).
    #[arg(long, env = "EODH_ENVIRONMENT", global = true, default_value = "prod")]
    pub environment: String,
}

impl ConnectionArgs {
    /// Build a client from the arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or environment is invalid.
    pub fn connect(&self) -> Result<EodhClient> {
        let token = self.token.clone().filter(|t| !t.is_empty());
        let auth = match (token, &self.username, &self.password) {
            (Some(token), _, _) => Auth::Bearer(token),
            (None, Some(username), Some(password)) => Auth::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            _ => Auth::None,
        };

        let environment: Environment = self.environment.parse()?;
        let mut client = EodhClient::new(&self.api_url, auth)?.with_environment(environment);
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            client = client.with_username(username);
        }
        Ok(client)
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the resource catalogue is up.
    Ping,

    /// List the conformance classes of the resource catalogue.
    Conformance,

    /// Get a single entity by ID.
    Get {
        /// The type of entity to get.
        entity: Entity,

        /// The entity ID (nested catalogs as `parent/child`).
        id: String,

        /// Catalog holding the collection.
        #[arg(long)]
        catalog: Option<String>,

        /// Collection holding the item.
        #[arg(long)]
        collection: Option<String>,
    },

    /// List entities.
    List {
        /// The type of entity to list.
        entity: Entity,

        /// Catalog to list catalogs or collections of.
        #[arg(long)]
        catalog: Option<String>,

        /// Collection to list items of (required for items).
        #[arg(long)]
        collection: Option<String>,

        /// Maximum number of entries to show.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Search items in the catalogue.
    Search {
        /// Restrict to a collection (repeatable).
        #[arg(long = "collection")]
        collections: Vec<String>,

        /// Search within a catalog instead of the whole catalogue.
        #[arg(long)]
        catalog: Option<String>,

        /// Bounding box as `west,south,east,north`.
        #[arg(long, allow_hyphen_values = true)]
        bbox: Option<String>,

        /// Datetime or interval, e.g. `2024-01-01T00:00:00Z/..`.
        #[arg(long)]
        datetime: Option<String>,

        /// Query expression such as `eo:cloud_cover<=10` (repeatable).
        #[arg(long = "query")]
        query: Vec<String>,

        /// Maximum number of items to show.
        #[arg(long, default_value = "10")]
        limit: u32,
    },

    /// Deploy a CWL workflow to the ADES.
    Deploy {
        #[command(flatten)]
        cwl: CwlArgs,
    },

    /// Execute a deployed process.
    Execute {
        /// The process ID.
        process: String,

        /// Inputs as a JSON object.
        #[arg(long, default_value = "{}")]
        inputs: String,

        /// Poll the job until it finishes.
        #[arg(long)]
        wait: bool,

        /// Seconds between polls with `--wait`.
        #[arg(long, default_value = "5")]
        poll_secs: u64,
    },

    /// Print the capabilities document of a map service.
    Capabilities {
        /// The map service.
        service: MapServiceArg,
    },

    /// Upload a file to a workspace.
    Upload {
        /// Local file to upload.
        file: PathBuf,

        /// Destination path inside the workspace.
        path: String,

        /// Workspace name (defaults to the username).
        #[arg(long)]
        workspace: Option<String>,
    },
}

/// Source of a workflow to deploy.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct CwlArgs {
    /// URL of the CWL file.
    #[arg(long)]
    pub cwl_url: Option<String>,

    /// Local CWL file to upload inline.
    #[arg(long)]
    pub cwl_file: Option<PathBuf>,
}

/// Map services published by the hub.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapServiceArg {
    Wmts,
    Wms,
}

impl From<MapServiceArg> for MapService {
    fn from(arg: MapServiceArg) -> Self {
        match arg {
            MapServiceArg::Wmts => MapService::Wmts,
            MapServiceArg::Wms => MapService::Wms,
        }
    }
}

/// Entity types that can be operated on.
#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum Entity {
    /// A STAC catalog.
    #[value(alias = "catalogs")]
    Catalog,
    /// A STAC collection.
    #[value(alias = "collections")]
    Collection,
    /// A STAC item.
    #[value(alias = "items")]
    Item,
    /// An ADES process.
    #[value(alias = "processes")]
    Process,
    /// An ADES job.
    #[value(alias = "jobs")]
    Job,
}

/// Parse `west,south,east,north` (or six values with elevation).
///
/// # Errors
///
/// Returns [`EodhError::InvalidArgument`] for a malformed box.
pub fn parse_bbox(s: &str) -> Result<Vec<f64>> {
    let values = s
        .split(',')
        .map(|v| {
            v.trim().parse::<f64>().map_err(|e| {
                EodhError::InvalidArgument(format!("invalid bbox coordinate '{v}': {e}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    match values.len() {
        4 | 6 => Ok(values),
        n => Err(EodhError::InvalidArgument(format!(
            "bbox needs 4 or 6 values, got {n}"
        ))),
    }
}

/// Parse a JSON object given on the command line.
///
/// # Errors
///
/// Returns [`EodhError::InvalidArgument`] unless `s` is a JSON object.
pub fn parse_inputs(s: &str) -> Result<serde_json::Map<String, serde_json::Value>> {
    match serde_json::from_str(s)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(EodhError::InvalidArgument(
            "inputs must be a JSON object".to_string(),
        )),
    }
}

/// Install the log subscriber.
///
/// Warnings only by default; `EODHAPI_DEBUG=1` (or `true`, `yes`, `on`)
/// enables debug output, and `RUST_LOG` takes precedence over both.
pub fn init_tracing() {
    let debug = std::env::var("EODHAPI_DEBUG")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false);
    let default = if debug { "eodhapi=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A subscriber may already be installed (tests, embedding programs)
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
