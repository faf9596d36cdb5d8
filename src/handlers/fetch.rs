use axum::{extract::State, Json};
use serde::Deserialize;

use super::error::{ApiError, ApiResult};
use crate::{
    platform::{instagram::parse_shortcode, PostMetadata},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct FetchRequest {
    pub url: String,
}

pub async fn fetch_post(
    State(state): State<AppState>,
    Json(request): Json<FetchRequest>,
) -> ApiResult<Json<PostMetadata>> {
    let shortcode = parse_shortcode(&request.url).map_err(|e| {
        debug!("Rejected fetch request: {}", e);
        ApiError::bad_request("Invalid Instagram URL")
    })?;

    info!("Fetching post {}", shortcode);

    let metadata = state
        .fetcher
        .fetch(&shortcode)
        .await
        .map_err(|e| ApiError::from_fetch_error(e, state.error_detail))?;

    Ok(Json(metadata))
}
