//! Hypermedia links shared by every STAC and OGC document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Well-known link relation types.
pub mod rel {
    pub const SELF: &str = "self";
    pub const ROOT: &str = "root";
    pub const PARENT: &str = "parent";
    pub const CHILD: &str = "child";
    pub const NEXT: &str = "next";
    pub const DATA: &str = "data";
    pub const ITEMS: &str = "items";
    pub const COLLECTION: &str = "collection";
    /// OGC API Processes: list of deployed processes.
    pub const PROCESSES: &str = "http://www.opengis.net/def/rel/ogc/1.0/processes";
    /// OGC API Processes: list of jobs.
    pub const JOBS: &str = "http://www.opengis.net/def/rel/ogc/1.0/job-list";
    /// OGC API Processes: execution endpoint of a process.
    pub const EXECUTE: &str = "http://www.opengis.net/def/rel/ogc/1.0/execute";
    /// OGC API Processes: results of a job.
    pub const RESULTS: &str = "http://www.opengis.net/def/rel/ogc/1.0/results";
}

/// A hypermedia link.
///
/// STAC `next` links may also carry `method`, `body` and `merge`, describing
/// a POST request that fetches the following page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Relationship type (e.g. `self`, `next`, or an OGC rel URI).
    pub rel: String,

    /// Target URL.
    pub href: String,

    /// Media type of the linked resource.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// HTTP method for following the link (GET when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Request body for POST links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// Whether `body` is merged over the previous request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<bool>,
}

impl Link {
    /// Create a plain GET link.
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            media_type: None,
            title: None,
            method: None,
            body: None,
            merge: None,
        }
    }

    /// Find the first link with relation `rel`.
    pub fn find<'a>(links: &'a [Link], rel: &str) -> Option<&'a Link> {
        links.iter().find(|l| l.rel == rel)
    }

    /// Whether following this link needs a POST.
    pub fn is_post(&self) -> bool {
        self.method
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("POST"))
    }
}
