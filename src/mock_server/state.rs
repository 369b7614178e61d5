//! Mock server state management.
//!
//! Provides the in-memory data store for the mock EODH server.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{Catalog, Collection, Item, Job, JobStatus, Process, SearchParams};

/// A stored workspace upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}

/// Shared state for the mock server.
///
/// Catalogs are keyed by their path (`parent/child`), collections and
/// items by the path of the catalog holding them.
#[derive(Debug, Default)]
pub struct MockState {
    /// Base URL links are rendered with, set when the server binds.
    pub base_url: String,

    /// Catalogs indexed by path (e.g. "supported-datasets/ceda-stac-fastapi").
    pub catalogs: BTreeMap<String, Catalog>,

    /// Collections indexed by (catalog path, collection ID).
    pub collections: BTreeMap<(String, String), Collection>,

    /// Items per (catalog path, collection ID), in insertion order.
    pub items: HashMap<(String, String), Vec<Item>>,

    /// Whether the catalogue advertises the transaction extensions.
    pub transactions: bool,

    /// ADES account name.
    pub username: String,

    /// Deployed processes indexed by ID.
    pub processes: BTreeMap<String, Process>,

    /// Jobs indexed by ID.
    pub jobs: BTreeMap<String, Job>,

    job_counter: u64,

    /// Workspace uploads indexed by `{workspace}/{path}`.
    pub uploads: HashMap<String, Upload>,

    /// Optional authentication token. If set, ADES, workspace and
    /// transactional requests must include this token.
    pub required_token: Option<String>,
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Add a catalog at `path`.
    pub fn with_catalog(mut self, path: &str, catalog: Catalog) -> Self {
        self.catalogs.insert(path.to_string(), catalog);
        self
    }

    /// Add a collection to the catalog at `catalog_path`.
    pub fn with_collection(mut self, catalog_path: &str, collection: Collection) -> Self {
        self.insert_collection(catalog_path, collection);
        self
    }

    /// Add items to a collection.
    pub fn with_items(mut self, catalog_path: &str, collection_id: &str, items: Vec<Item>) -> Self {
        self.items
            .entry((catalog_path.to_string(), collection_id.to_string()))
            .or_default()
            .extend(items);
        self
    }

    /// Add a process.
    pub fn with_process(mut self, process: Process) -> Self {
        self.processes.insert(process.id.clone(), process);
        self
    }

    /// Advertise the transaction extensions.
    pub fn with_transactions(mut self) -> Self {
        self.transactions = true;
        self
    }

    /// Set the ADES account name.
    pub fn with_username(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    /// Set the required authentication token.
    pub fn with_required_token(mut self, token: &str) -> Self {
        self.required_token = Some(token.to_string());
        self
    }

    /// Whether `authorization` satisfies the token requirement.
    pub fn is_authorized(&self, authorization: Option<&str>) -> bool {
        match &self.required_token {
            None => true,
            Some(token) => authorization == Some(format!("Bearer {token}").as_str()),
        }
    }

    /// Conformance classes of the catalogue.
    pub fn conformance(&self) -> Vec<String> {
        let mut classes = vec![
            "https://api.stacspec.org/v1.0.0/core".to_string(),
            "https://api.stacspec.org/v1.0.0/collections".to_string(),
            "https://api.stacspec.org/v1.0.0/ogcapi-features".to_string(),
            "https://api.stacspec.org/v1.0.0/item-search".to_string(),
        ];
        if self.transactions {
            classes.push(crate::TRANSACTION_CONFORMANCE.to_string());
            classes.push(crate::COLLECTION_TRANSACTION_CONFORMANCE.to_string());
        }
        classes
    }

    /// Direct children of the catalog at `parent` (top level for `""`).
    pub fn child_catalogs(&self, parent: &str) -> Vec<(&String, &Catalog)> {
        self.catalogs
            .iter()
            .filter(|(path, _)| parent_of(path) == parent)
            .collect()
    }

    /// Collections of the catalog at `catalog_path`.
    pub fn catalog_collections(&self, catalog_path: &str) -> Vec<&Collection> {
        self.collections
            .iter()
            .filter(|((path, _), _)| path == catalog_path)
            .map(|(_, c)| c)
            .collect()
    }

    /// First collection with `id`, in any catalog.
    pub fn find_collection(&self, id: &str) -> Option<(&String, &Collection)> {
        self.collections
            .iter()
            .find(|((_, cid), _)| cid == id)
            .map(|((path, _), c)| (path, c))
    }

    pub fn insert_collection(&mut self, catalog_path: &str, collection: Collection) {
        let key = (catalog_path.to_string(), collection.id.clone());
        self.items.entry(key.clone()).or_default();
        self.collections.insert(key, collection);
    }

    /// Remove a catalog together with everything below it.
    pub fn remove_catalog(&mut self, path: &str) -> bool {
        let below = |p: &str| p == path || p.starts_with(&format!("{path}/"));
        let existed = self.catalogs.remove(path).is_some();
        self.catalogs.retain(|p, _| !below(p));
        self.collections.retain(|(p, _), _| !below(p));
        self.items.retain(|(p, _), _| !below(p));
        existed
    }

    pub fn remove_collection(&mut self, catalog_path: &str, id: &str) -> bool {
        let key = (catalog_path.to_string(), id.to_string());
        self.items.remove(&key);
        self.collections.remove(&key).is_some()
    }

    /// Items matching `params` across all collections, with their catalog path.
    pub fn search(&self, catalog_path: Option<&str>, params: &SearchParams) -> Vec<(&String, &Item)> {
        let mut keys: Vec<_> = self.items.keys().collect();
        keys.sort();

        keys.into_iter()
            .filter(|(path, _)| catalog_path.map_or(true, |c| path == c))
            .filter(|(_, col)| {
                params
                    .collections
                    .as_ref()
                    .map_or(true, |cols| cols.iter().any(|c| c == col))
            })
            .flat_map(|key| self.items[key].iter().map(move |item| (&key.0, item)))
            .filter(|(_, item)| {
                params
                    .ids
                    .as_ref()
                    .map_or(true, |ids| ids.iter().any(|id| *id == item.id))
            })
            .filter(|(_, item)| match (&params.bbox, &item.bbox) {
                (Some(query), Some(bbox)) => bbox_intersects(query, bbox),
                _ => true,
            })
            .collect()
    }

    /// Start a job for `process_id`.
    pub fn create_job(&mut self, process_id: &str) -> Job {
        self.job_counter += 1;
        let job = Job {
            id: format!("job-{:04}", self.job_counter),
            process_id: Some(process_id.to_string()),
            job_type: Some("process".to_string()),
            status: JobStatus::Accepted,
            message: Some("Job accepted".to_string()),
            progress: Some(0),
            created: Some(Utc::now()),
            started: None,
            finished: None,
            updated: Some(Utc::now()),
            links: Vec::new(),
            extra: Default::default(),
        };
        self.jobs.insert(job.id.clone(), job.clone());
        job
    }

    /// Move a job one step along accepted, running, successful.
    pub fn advance_job(&mut self, id: &str) -> Option<&Job> {
        let job = self.jobs.get_mut(id)?;
        let now = Utc::now();
        match job.status {
            JobStatus::Accepted => {
                job.status = JobStatus::Running;
                job.progress = Some(50);
                job.started = Some(now);
                job.message = Some("Workflow running".to_string());
            }
            JobStatus::Running => {
                job.status = JobStatus::Successful;
                job.progress = Some(100);
                job.finished = Some(now);
                job.message = Some("Workflow finished".to_string());
            }
            _ => return Some(job),
        }
        job.updated = Some(now);
        Some(job)
    }

    /// Dismiss a job.
    pub fn dismiss_job(&mut self, id: &str) -> Option<&Job> {
        let job = self.jobs.get_mut(id)?;
        job.status = JobStatus::Dismissed;
        job.message = Some("Job dismissed".to_string());
        job.updated = Some(Utc::now());
        Some(job)
    }
}

/// Path of the parent catalog (`""` for top-level catalogs).
pub fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

fn bbox_intersects(a: &[f64], b: &[f64]) -> bool {
    if a.len() < 4 || b.len() < 4 {
        return true;
    }
    // 6-value boxes carry elevation after the horizontal minimums
    let (aw, as_, ae, an) = corners(a);
    let (bw, bs, be, bn) = corners(b);
    aw <= be && bw <= ae && as_ <= bn && bs <= an
}

fn corners(b: &[f64]) -> (f64, f64, f64, f64) {
    if b.len() >= 6 {
        (b[0], b[1], b[3], b[4])
    } else {
        (b[0], b[1], b[2], b[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_server::Fixtures;

    #[test]
    fn test_child_catalogs() {
        let state = MockState::new()
            .with_catalog("a", Fixtures::catalog("a", "A"))
            .with_catalog("a/b", Fixtures::catalog("b", "B"))
            .with_catalog("a/b/c", Fixtures::catalog("c", "C"))
            .with_catalog("d", Fixtures::catalog("d", "D"));

        let top: Vec<_> = state.child_catalogs("").into_iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(top, vec!["a", "d"]);
        let nested: Vec<_> = state.child_catalogs("a").into_iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(nested, vec!["a/b"]);
    }

    #[test]
    fn test_remove_catalog_cascades() {
        let mut state = MockState::new()
            .with_catalog("a", Fixtures::catalog("a", "A"))
            .with_catalog("a/b", Fixtures::catalog("b", "B"))
            .with_collection("a/b", Fixtures::collection("col", "Col"));

        assert!(state.remove_catalog("a"));
        assert!(state.catalogs.is_empty());
        assert!(state.collections.is_empty());
        assert!(!state.remove_catalog("a"));
    }

    #[test]
    fn test_search_filters() {
        let state = MockState::new()
            .with_collection("a", Fixtures::collection("c1", "C1"))
            .with_collection("a", Fixtures::collection("c2", "C2"))
            .with_items("a", "c1", Fixtures::items("c1", 3))
            .with_items("a", "c2", Fixtures::items("c2", 2));

        assert_eq!(state.search(None, &SearchParams::new()).len(), 5);
        assert_eq!(state.search(None, &SearchParams::new().collections(&["c2"])).len(), 2);
        assert_eq!(state.search(None, &SearchParams::new().ids(&["c1-item-001"])).len(), 1);
        assert_eq!(state.search(Some("other"), &SearchParams::new()).len(), 0);
    }

    #[test]
    fn test_job_lifecycle() {
        let mut state = MockState::new();
        let job = state.create_job("convert-url");
        assert_eq!(job.status, JobStatus::Accepted);

        assert_eq!(state.advance_job(&job.id).unwrap().status, JobStatus::Running);
        assert_eq!(state.advance_job(&job.id).unwrap().status, JobStatus::Successful);
        assert_eq!(state.advance_job(&job.id).unwrap().status, JobStatus::Successful);
        assert_eq!(state.dismiss_job(&job.id).unwrap().status, JobStatus::Dismissed);
    }

    #[test]
    fn test_token_check() {
        let open = MockState::new();
        assert!(open.is_authorized(None));

        let locked = MockState::new().with_required_token("secret");
        assert!(!locked.is_authorized(None));
        assert!(!locked.is_authorized(Some("Bearer wrong")));
        assert!(locked.is_authorized(Some("Bearer secret")));
    }
}
