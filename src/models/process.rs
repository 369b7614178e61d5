//! OGC API Processes process description.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::models::ades::CwlSource;
use crate::models::job::Job;
use crate::models::link::{rel, Link};
use crate::resource::Resource;
use crate::traits::Linked;
use crate::util::join_url;

/// A metadata link of a process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// A named list of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub value: Vec<Value>,
}

/// Vendor parameters attached to a process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// A process deployed on the ADES.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutable: Option<bool>,

    #[serde(default)]
    pub job_control_options: Vec<String>,

    #[serde(default)]
    pub output_transmission: Vec<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub metadata: Vec<ProcessMetadata>,

    #[serde(default)]
    pub additional_parameters: AdditionalParameters,

    /// Input schema, keyed by input name.
    #[serde(default)]
    pub inputs: Map<String, Value>,

    /// Output schema, keyed by output name.
    #[serde(default)]
    pub outputs: Map<String, Value>,

    #[serde(default)]
    pub links: Vec<Link>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Linked for Process {
    const ENTITY: &'static str = "Process";

    fn links(&self) -> &[Link] {
        &self.links
    }
}

impl Resource<Process> {
    /// URL of the execution endpoint.
    pub fn execute_href(&self) -> Result<String> {
        match self.link(rel::EXECUTE) {
            Some(link) => Ok(link.href.clone()),
            None => join_url(&self.self_href()?, &["execution"]),
        }
    }

    /// Start an asynchronous job with `inputs`.
    ///
    /// Calls: `POST {process}/execution` with `Prefer: respond-async`
    #[tracing::instrument(skip(self, inputs), fields(process = %self.id))]
    pub async fn execute(&self, inputs: Map<String, Value>) -> Result<Resource<Job>> {
        let builder = self
            .client()
            .request(Method::POST, &self.execute_href()?)?
            .header("Prefer", "respond-async")
            .json(&json!({ "inputs": inputs }));
        let response = self.client().send(builder).await?;
        let job: Resource<Job> = Resource::from_response(self.client().clone(), response).await?;
        tracing::debug!(job = %job.id, status = %job.status, "job started");
        Ok(job)
    }

    /// Replace the workflow of this process.
    ///
    /// Calls: `PUT {process}`, then `GET {process}`
    #[tracing::instrument(skip(self, cwl), fields(process = %self.id))]
    pub async fn update(&mut self, cwl: CwlSource) -> Result<()> {
        let href = self.self_href()?;
        cwl.send(self.client(), Method::PUT, &href).await?;
        self.refresh().await
    }

    /// Undeploy this process.
    #[tracing::instrument(skip(self), fields(process = %self.id))]
    pub async fn delete(&self) -> Result<()> {
        self.delete_self().await?;
        Ok(())
    }
}
