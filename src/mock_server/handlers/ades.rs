//! ADES (OGC API Processes) handlers.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{
        header::{CONTENT_TYPE, LOCATION},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

use super::{authorize, error, not_found, SharedState};
use crate::mock_server::state::MockState;
use crate::mock_server::Fixtures;
use crate::{rel, Job, JobStatus, Link, Process, CWL_YAML_MEDIA_TYPE};

fn ades_root(base: &str, user: &str) -> String {
    format!("{base}/api/ades/{user}/ogc-api/")
}

fn process_href(base: &str, user: &str, id: &str) -> String {
    format!("{}processes/{}", ades_root(base, user), urlencoding::encode(id))
}

fn job_href(base: &str, user: &str, id: &str) -> String {
    format!("{}jobs/{}", ades_root(base, user), urlencoding::encode(id))
}

fn render_process(base: &str, user: &str, process: &Process) -> Value {
    let href = process_href(base, user, &process.id);
    let mut process = process.clone();
    process.links = vec![
        Link::new(rel::SELF, href.clone()),
        Link::new(rel::EXECUTE, format!("{href}/execution")),
    ];
    json!(process)
}

fn render_job(base: &str, user: &str, job: &Job) -> Value {
    let href = job_href(base, user, &job.id);
    let mut job = job.clone();
    job.links = vec![
        Link::new(rel::SELF, href.clone()),
        Link::new("up", format!("{}jobs", ades_root(base, user))),
    ];
    if job.status == JobStatus::Successful {
        job.links.push(Link::new(rel::RESULTS, format!("{href}/results")));
    }
    json!(job)
}

/// Check the token and that `user` owns this ADES.
fn check_access(state: &MockState, user: &str, headers: &HeaderMap) -> Result<(), Response> {
    authorize(state, headers)?;
    if state.username != user {
        return Err(not_found(format!("No ADES for user {user}")));
    }
    Ok(())
}

/// A workflow as sent to deploy or replace a process.
struct Workflow {
    id: String,
    label: Option<String>,
    doc: Option<String>,
}

/// Read a deployment body: inline CWL YAML or an `executionUnit` reference.
fn parse_workflow(headers: &HeaderMap, body: &[u8]) -> Result<Workflow, Response> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with(CWL_YAML_MEDIA_TYPE) {
        let text = String::from_utf8_lossy(body);
        let field = |name: &str| {
            text.lines()
                .map(str::trim_start)
                .map(|l| l.trim_start_matches("- "))
                .find_map(|l| l.strip_prefix(&format!("{name}:")[..]))
                .map(|v| v.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
                .filter(|v| !v.is_empty())
        };
        let id = field("id")
            .map(|id| id.trim_start_matches('#').to_string())
            .ok_or_else(|| error(StatusCode::BAD_REQUEST, "CWL document has no id"))?;
        return Ok(Workflow {
            id,
            label: field("label"),
            doc: field("doc"),
        });
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| error(StatusCode::BAD_REQUEST, e.to_string()))?;
    let href = value
        .pointer("/executionUnit/href")
        .and_then(Value::as_str)
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "executionUnit.href is required"))?;
    let file = href.rsplit('/').next().unwrap_or(href);
    let id = file.split('.').next().unwrap_or(file).to_string();
    Ok(Workflow {
        id,
        label: None,
        doc: None,
    })
}

fn bump_patch(version: Option<&str>) -> String {
    let mut parts: Vec<u64> = version
        .unwrap_or("0.0.0")
        .split('.')
        .map(|p| p.parse().unwrap_or(0))
        .collect();
    parts.resize(3, 0);
    parts[2] += 1;
    format!("{}.{}.{}", parts[0], parts[1], parts[2])
}

/// GET /api/ades/{user}/ogc-api/
pub async fn ades_landing(
    State(state): State<SharedState>,
    Path(user): Path<String>,
    headers: HeaderMap,
) -> Response {
    let state = state.read().await;
    if let Err(e) = check_access(&state, &user, &headers) {
        return e;
    }
    let root = ades_root(&state.base_url, &user);
    Json(json!({
        "title": "ADES",
        "description": "Application Deployment and Execution Service",
        "links": [
            Link::new(rel::SELF, root.clone()),
            Link::new(rel::PROCESSES, format!("{root}processes")),
            Link::new(rel::JOBS, format!("{root}jobs")),
        ],
    }))
    .into_response()
}

/// GET /api/ades/{user}/ogc-api/processes
pub async fn list_processes(
    State(state): State<SharedState>,
    Path(user): Path<String>,
    headers: HeaderMap,
) -> Response {
    let state = state.read().await;
    if let Err(e) = check_access(&state, &user, &headers) {
        return e;
    }
    let processes: Vec<Value> = state
        .processes
        .values()
        .map(|p| render_process(&state.base_url, &user, p))
        .collect();
    Json(json!({
        "processes": processes,
        "links": [Link::new(rel::SELF, format!("{}processes", ades_root(&state.base_url, &user)))],
    }))
    .into_response()
}

/// POST /api/ades/{user}/ogc-api/processes
pub async fn deploy_process(
    State(state): State<SharedState>,
    Path(user): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut state = state.write().await;
    if let Err(e) = check_access(&state, &user, &headers) {
        return e;
    }
    let workflow = match parse_workflow(&headers, &body) {
        Ok(w) => w,
        Err(e) => return e,
    };
    if state.processes.contains_key(&workflow.id) {
        return error(StatusCode::CONFLICT, format!("Process {} already deployed", workflow.id));
    }

    let mut process = Fixtures::deployed_process(&workflow.id);
    process.title = workflow.label.or(process.title);
    process.description = workflow.doc.or(process.description);
    let location = process_href(&state.base_url, &user, &process.id);
    state.processes.insert(process.id.clone(), process);

    (
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(json!({"id": workflow.id})),
    )
        .into_response()
}

/// GET /api/ades/{user}/ogc-api/processes/{id}
pub async fn get_process(
    State(state): State<SharedState>,
    Path((user, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let state = state.read().await;
    if let Err(e) = check_access(&state, &user, &headers) {
        return e;
    }
    match state.processes.get(&id) {
        Some(p) => Json(render_process(&state.base_url, &user, p)).into_response(),
        None => not_found(format!("Process {id} not found")),
    }
}

/// PUT /api/ades/{user}/ogc-api/processes/{id}
pub async fn replace_process(
    State(state): State<SharedState>,
    Path((user, id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut state = state.write().await;
    if let Err(e) = check_access(&state, &user, &headers) {
        return e;
    }
    let workflow = match parse_workflow(&headers, &body) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let Some(process) = state.processes.get_mut(&id) else {
        return not_found(format!("Process {id} not found"));
    };
    if workflow.id != id {
        return error(
            StatusCode::BAD_REQUEST,
            format!("Workflow id {} does not match process {id}", workflow.id),
        );
    }
    process.version = Some(bump_patch(process.version.as_deref()));
    if workflow.label.is_some() {
        process.title = workflow.label;
    }
    if workflow.doc.is_some() {
        process.description = workflow.doc;
    }
    StatusCode::NO_CONTENT.into_response()
}

/// DELETE /api/ades/{user}/ogc-api/processes/{id}
pub async fn undeploy_process(
    State(state): State<SharedState>,
    Path((user, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.write().await;
    if let Err(e) = check_access(&state, &user, &headers) {
        return e;
    }
    match state.processes.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(format!("Process {id} not found")),
    }
}

/// POST /api/ades/{user}/ogc-api/processes/{id}/execution
pub async fn execute_process(
    State(state): State<SharedState>,
    Path((user, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.write().await;
    if let Err(e) = check_access(&state, &user, &headers) {
        return e;
    }
    if !state.processes.contains_key(&id) {
        return not_found(format!("Process {id} not found"));
    }
    if !body.get("inputs").is_some_and(Value::is_object) {
        return error(StatusCode::BAD_REQUEST, "inputs object is required");
    }

    let job = state.create_job(&id);
    let location = job_href(&state.base_url, &user, &job.id);
    (
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(render_job(&state.base_url, &user, &job)),
    )
        .into_response()
}

/// GET /api/ades/{user}/ogc-api/jobs
pub async fn list_jobs(
    State(state): State<SharedState>,
    Path(user): Path<String>,
    headers: HeaderMap,
) -> Response {
    let state = state.read().await;
    if let Err(e) = check_access(&state, &user, &headers) {
        return e;
    }
    let jobs: Vec<Value> = state
        .jobs
        .values()
        .map(|j| render_job(&state.base_url, &user, j))
        .collect();
    Json(json!({
        "jobs": jobs,
        "links": [Link::new(rel::SELF, format!("{}jobs", ades_root(&state.base_url, &user)))],
    }))
    .into_response()
}

/// GET /api/ades/{user}/ogc-api/jobs/{id}
///
/// Each read moves the job one step towards completion.
pub async fn get_job(
    State(state): State<SharedState>,
    Path((user, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.write().await;
    if let Err(e) = check_access(&state, &user, &headers) {
        return e;
    }
    let base = state.base_url.clone();
    match state.advance_job(&id) {
        Some(job) => Json(render_job(&base, &user, job)).into_response(),
        None => not_found(format!("Job {id} not found")),
    }
}

/// DELETE /api/ades/{user}/ogc-api/jobs/{id}
pub async fn dismiss_job(
    State(state): State<SharedState>,
    Path((user, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.write().await;
    if let Err(e) = check_access(&state, &user, &headers) {
        return e;
    }
    let base = state.base_url.clone();
    match state.dismiss_job(&id) {
        Some(job) => Json(render_job(&base, &user, job)).into_response(),
        None => not_found(format!("Job {id} not found")),
    }
}

/// GET /api/ades/{user}/ogc-api/jobs/{id}/results
pub async fn job_results(
    State(state): State<SharedState>,
    Path((user, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let state = state.read().await;
    if let Err(e) = check_access(&state, &user, &headers) {
        return e;
    }
    match state.jobs.get(&id) {
        Some(job) if job.status == JobStatus::Successful => {
            let mut outputs = Map::new();
            outputs.insert(
                "converted".to_string(),
                json!({"href": format!("{}/outputs/{id}.tif", job_href(&state.base_url, &user, &id))}),
            );
            Json(Value::Object(outputs)).into_response()
        }
        Some(job) => error(
            StatusCode::NOT_FOUND,
            format!("Results of job {id} not ready, status is {}", job.status),
        ),
        None => not_found(format!("Job {id} not found")),
    }
}
