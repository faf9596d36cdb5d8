use axum::{
    body::Body,
    extract::{Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::Response,
};
use serde::Deserialize;

use super::error::{ApiError, ApiResult};
use crate::{service::proxy::content_disposition, state::AppState};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
pub struct MediaProxyQuery {
    pub url: String,
    pub filename: Option<String>,
}

/// Relays upstream bytes chunk by chunk. Dropping the response (client gone)
/// drops the upstream stream and closes its connection.
pub async fn media_proxy(
    State(state): State<AppState>,
    Query(query): Query<MediaProxyQuery>,
) -> ApiResult<Response> {
    let upstream = state.media_proxy.open(&query.url).await.map_err(|e| {
        error!("Media proxy failed: {}", e);
        ApiError::internal(format!("Failed to fetch media: {}", e))
    })?;

    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type);

    if let Some(length) = upstream.headers().get(CONTENT_LENGTH).cloned() {
        builder = builder.header(CONTENT_LENGTH, length);
    }

    if let Some(filename) = query.filename.as_deref().filter(|f| !f.trim().is_empty()) {
        let disposition = HeaderValue::from_str(&content_disposition(filename))
            .map_err(|e| ApiError::internal(format!("Failed to build Content-Disposition: {}", e)))?;
        builder = builder.header(CONTENT_DISPOSITION, disposition);
    }

    builder
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}
