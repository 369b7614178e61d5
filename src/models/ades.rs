//! ADES service root (OGC API Processes landing page).

use reqwest::header::LOCATION;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{EodhError, Result};
use crate::models::job::Job;
use crate::models::link::{rel, Link};
use crate::models::process::Process;
use crate::pagination::{PageRequest, PaginatedList};
use crate::resource::Resource;
use crate::traits::Linked;
use crate::util::join_url;

/// Media type of a CWL document sent inline.
pub const CWL_YAML_MEDIA_TYPE: &str = "application/cwl+yaml";

/// Landing page of a user's ADES.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ades {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub links: Vec<Link>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Linked for Ades {
    const ENTITY: &'static str = "Ades";

    fn links(&self) -> &[Link] {
        &self.links
    }
}

/// Where a CWL workflow comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CwlSource {
    /// A URL the ADES downloads the workflow from.
    Url(String),
    /// The workflow itself, as CWL YAML.
    Yaml(String),
}

impl CwlSource {
    /// Send this workflow to `url` with `method`.
    pub(crate) async fn send(
        &self,
        client: &crate::client::EodhClient,
        method: Method,
        url: &str,
    ) -> Result<reqwest::Response> {
        match self {
            Self::Url(href) => {
                let body = json!({
                    "executionUnit": {
                        "href": href,
                        "type": "application/cwl",
                    }
                });
                let builder = client.request(method, url)?.json(&body);
                client.send(builder).await
            }
            Self::Yaml(yaml) => {
                client
                    .send_raw(method, url, CWL_YAML_MEDIA_TYPE, yaml.as_bytes().to_vec())
                    .await
            }
        }
    }
}

impl Resource<Ades> {
    /// URL of the process list.
    pub fn processes_href(&self) -> Result<&str> {
        self.href(rel::PROCESSES)
    }

    /// URL of the job list.
    pub fn jobs_href(&self) -> Result<&str> {
        self.href(rel::JOBS)
    }

    /// Deployed processes.
    ///
    /// Calls: `GET {processes}`
    #[tracing::instrument(skip(self))]
    pub async fn get_processes(&self) -> Result<Vec<Resource<Process>>> {
        PaginatedList::new(
            self.client().clone(),
            PageRequest::get(self.processes_href()?),
            "processes",
        )
        .collect_all()
        .await
    }

    /// A deployed process by ID.
    ///
    /// Calls: `GET {processes}/{process_id}`
    #[tracing::instrument(skip(self))]
    pub async fn get_process(&self, process_id: &str) -> Result<Resource<Process>> {
        let url = join_url(self.processes_href()?, &[&*urlencoding::encode(process_id)])?;
        Resource::fetch(self.client(), &url).await
    }

    /// Deploy a CWL workflow as a new process.
    ///
    /// Calls: `POST {processes}`, then `GET` on the returned `Location`.
    ///
    /// # Errors
    ///
    /// Returns [`EodhError::MissingHeader`] if the response has no
    /// `Location` header.
    #[tracing::instrument(skip(self, cwl))]
    pub async fn deploy_process(&self, cwl: CwlSource) -> Result<Resource<Process>> {
        let response = cwl
            .send(self.client(), Method::POST, self.processes_href()?)
            .await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(EodhError::MissingHeader("Location"))?
            .to_string();

        tracing::debug!(%location, "process deployed");
        Resource::fetch(self.client(), &location).await
    }

    /// Jobs of this user.
    ///
    /// Calls: `GET {jobs}`
    #[tracing::instrument(skip(self))]
    pub async fn get_jobs(&self) -> Result<Vec<Resource<Job>>> {
        PaginatedList::new(
            self.client().clone(),
            PageRequest::get(self.jobs_href()?),
            "jobs",
        )
        .collect_all()
        .await
    }

    /// A job by ID.
    ///
    /// Calls: `GET {jobs}/{job_id}`
    #[tracing::instrument(skip(self))]
    pub async fn get_job(&self, job_id: &str) -> Result<Resource<Job>> {
        let url = join_url(self.jobs_href()?, &[&*urlencoding::encode(job_id)])?;
        Resource::fetch(self.client(), &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ades_links() {
        let ades: Ades = serde_json::from_value(json!({
            "title": "ADES",
            "links": [
                {"rel": "self", "href": "https://hub/api/ades/u/ogc-api/"},
                {"rel": rel::PROCESSES, "href": "https://hub/api/ades/u/ogc-api/processes"},
                {"rel": rel::JOBS, "href": "https://hub/api/ades/u/ogc-api/jobs"}
            ]
        }))
        .unwrap();

        assert_eq!(ades.title.as_deref(), Some("ADES"));
        assert_eq!(
            ades.href(rel::PROCESSES).unwrap(),
            "https://hub/api/ades/u/ogc-api/processes"
        );
        assert_eq!(
            ades.href(rel::JOBS).unwrap(),
            "https://hub/api/ades/u/ogc-api/jobs"
        );
    }

    #[test]
    fn test_ades_missing_job_list() {
        let ades: Ades = serde_json::from_value(json!({"links": []})).unwrap();
        let err = ades.href(rel::JOBS).unwrap_err();
        assert!(matches!(err, EodhError::MissingLink { entity_type: "Ades", .. }));
    }
}
