//! HTTP request handlers for the mock server.

pub mod ades;
pub mod catalogue;
pub mod workspace;

pub use ades::*;
pub use catalogue::*;
pub use workspace::*;

use std::sync::Arc;

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::RwLock;

use crate::mock_server::state::MockState;

/// State shared by every handler.
pub type SharedState = Arc<RwLock<MockState>>;

/// JSON error body with `status`.
pub(crate) fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({
            "code": status.as_u16(),
            "description": message.into(),
        })),
    )
        .into_response()
}

pub(crate) fn not_found(message: impl Into<String>) -> Response {
    error(StatusCode::NOT_FOUND, message)
}

/// Reject the request unless it carries the required token.
pub(crate) fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if state.is_authorized(authorization) {
        Ok(())
    } else {
        Err(error(StatusCode::UNAUTHORIZED, "Not authenticated"))
    }
}

/// Slice `len` elements into 1-indexed pages of `limit`.
///
/// Returns the element range of `page` and whether a later page exists.
pub(crate) fn page_range(len: usize, limit: usize, page: usize) -> (std::ops::Range<usize>, bool) {
    let limit = limit.max(1);
    let start = page.saturating_sub(1).saturating_mul(limit).min(len);
    let end = start.saturating_add(limit).min(len);
    (start..end, end < len)
}
