//! OGC API Processes job status.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EodhError, Result};
use crate::models::link::{rel, Link};
use crate::resource::Resource;
use crate::traits::Linked;

/// Job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Accepted,
    Running,
    Successful,
    Failed,
    Dismissed,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Whether the job will not change state any more.
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::Accepted | Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Running => "running",
            Self::Successful => "successful",
            Self::Failed => "failed",
            Self::Dismissed => "dismissed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job started by executing a process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "jobID")]
    pub id: String,

    #[serde(rename = "processID", default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,

    pub status: JobStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Percent complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,

    #[serde(default)]
    pub links: Vec<Link>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Linked for Job {
    const ENTITY: &'static str = "Job";

    fn links(&self) -> &[Link] {
        &self.links
    }
}

impl Resource<Job> {
    /// Whether the job reached a final state in the current snapshot.
    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Dismiss the job.
    ///
    /// The ADES answers with the dismissed job, which becomes the new
    /// snapshot. Other responses leave the snapshot untouched.
    #[tracing::instrument(skip(self), fields(job = %self.id))]
    pub async fn delete(&mut self) -> Result<()> {
        let response = self.delete_self().await?;
        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(EodhError::HttpError)?;
        if let Ok(job) = serde_json::from_slice::<Job>(&bytes) {
            self.replace(headers, job);
        }
        Ok(())
    }

    /// Poll until the job finishes.
    ///
    /// Refreshes every `poll_interval`, at most `max_polls` times. Returns
    /// the final status.
    ///
    /// # Errors
    ///
    /// Returns [`EodhError::InvalidArgument`] if the job is still running
    /// after `max_polls` refreshes.
    #[tracing::instrument(skip(self), fields(job = %self.id))]
    pub async fn wait_until_finished(
        &mut self,
        poll_interval: Duration,
        max_polls: u32,
    ) -> Result<JobStatus> {
        let mut polls = 0;
        while !self.is_finished() {
            if polls >= max_polls {
                return Err(EodhError::InvalidArgument(format!(
                    "job {} still {} after {} polls",
                    self.id, self.status, polls
                )));
            }
            tokio::time::sleep(poll_interval).await;
            self.refresh().await?;
            polls += 1;
            tracing::debug!(status = %self.status, progress = ?self.progress, "polled job");
        }
        Ok(self.status)
    }

    /// Outputs of a finished job.
    ///
    /// Calls: `GET {results}`
    #[tracing::instrument(skip(self), fields(job = %self.id))]
    pub async fn get_results(&self) -> Result<Value> {
        let href = self.href(rel::RESULTS)?;
        let response = self.client().get(href).await?;
        response.json().await.map_err(EodhError::HttpError)
    }
}
