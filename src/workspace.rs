//! Workspace file store.
//!
//! Each user has a workspace bucket served per environment at
//! `https://{workspace}.{env}.eodatahub-workspaces.org.uk/files/workspaces-eodhp-{env}/`.

use std::path::Path;

use reqwest::Method;

use crate::client::{EodhClient, Environment};
use crate::error::{EodhError, Result};
use crate::util::join_url;

const OCTET_STREAM: &str = "application/octet-stream";

/// URL of `path` in the file store of `workspace`.
///
/// A leading `/` on `path` is dropped.
pub fn s3_url(workspace: &str, environment: Environment, path: &str) -> String {
    let path = strip_leading_slash(path);
    let env = environment.as_str();
    format!("https://{workspace}.{env}.eodatahub-workspaces.org.uk/files/workspaces-eodhp-{env}/{path}")
}

fn strip_leading_slash(path: &str) -> &str {
    match path.strip_prefix('/') {
        Some(stripped) => {
            tracing::warn!(%path, "workspace paths are relative, removing leading '/'");
            stripped.trim_start_matches('/')
        }
        None => path,
    }
}

/// Upload handle for workspace files, obtained from [`EodhClient::workspace`].
#[derive(Debug, Clone)]
pub struct Workspace {
    client: EodhClient,
    files_url: Option<String>,
}

impl Workspace {
    pub(crate) fn new(client: EodhClient) -> Self {
        Self {
            client,
            files_url: None,
        }
    }

    /// Send uploads to `files_url` instead of the hub's workspace host.
    ///
    /// Paths are joined directly onto `files_url`.
    #[must_use]
    pub fn with_files_url(mut self, files_url: impl Into<String>) -> Self {
        self.files_url = Some(files_url.into());
        self
    }

    /// Target URL of `path` in `workspace_name`, or the client's user workspace.
    ///
    /// # Errors
    ///
    /// Returns [`EodhError::ConfigMissing`] if no token is configured or no
    /// workspace name is known.
    pub fn file_url(&self, path: &str, workspace_name: Option<&str>) -> Result<String> {
        if !self.client.has_token() {
            return Err(EodhError::ConfigMissing(
                "a token is required to upload to a workspace".to_string(),
            ));
        }
        let workspace = workspace_name
            .or(self.client.username())
            .ok_or_else(|| EodhError::ConfigMissing("workspace name is required".to_string()))?;

        match &self.files_url {
            Some(base) => join_url(base, &[workspace, strip_leading_slash(path)]),
            None => Ok(s3_url(workspace, self.client.environment(), path)),
        }
    }

    /// Upload `content` to `path` in the workspace.
    ///
    /// Calls: `PUT {workspace files}/{path}`
    #[tracing::instrument(skip(self, content), fields(len = content.len()))]
    pub async fn upload_bytes(
        &self,
        content: Vec<u8>,
        path: &str,
        workspace_name: Option<&str>,
    ) -> Result<()> {
        let url = self.file_url(path, workspace_name)?;
        self.client
            .send_raw(Method::PUT, &url, OCTET_STREAM, content)
            .await?;
        tracing::debug!(%url, "uploaded");
        Ok(())
    }

    /// Upload the local file `local_path` to `path` in the workspace.
    ///
    /// # Errors
    ///
    /// Returns [`EodhError::Io`] if the file cannot be read.
    #[tracing::instrument(skip(self, local_path), fields(local = %local_path.as_ref().display()))]
    pub async fn upload_file(
        &self,
        local_path: impl AsRef<Path>,
        path: &str,
        workspace_name: Option<&str>,
    ) -> Result<()> {
        // Fail on configuration before touching the file system
        self.file_url(path, workspace_name)?;
        let content = tokio::fs::read(local_path.as_ref()).await?;
        self.upload_bytes(content, path, workspace_name).await
    }
}
