//! Workspace file upload handler.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use super::{authorize, error, SharedState};
use crate::mock_server::state::Upload;

/// PUT /files/{workspace}/{path}
pub async fn upload_file(
    State(state): State<SharedState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut state = state.write().await;
    if let Err(e) = authorize(&state, &headers) {
        return e;
    }
    if !key.contains('/') {
        return error(StatusCode::BAD_REQUEST, "expected {workspace}/{path}");
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let replaced = state
        .uploads
        .insert(
            key,
            Upload {
                content_type,
                content: body.to_vec(),
            },
        )
        .is_some();

    if replaced {
        StatusCode::OK.into_response()
    } else {
        StatusCode::CREATED.into_response()
    }
}
