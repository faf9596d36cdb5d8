mod error;
mod fetch;
mod health;
mod media;

use axum::{
    http::{header::CONTENT_DISPOSITION, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

/// Origins get credentials; methods and headers are mirrored from the
/// preflight, which is how "allow everything" works alongside credentials.
pub fn build_cors_layer(allowed_origins: &[String]) -> AppResult<CorsLayer> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin.trim_end_matches('/')).map_err(|_| AppError::InvalidOrigin(origin.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!("CORS allow-list: {:?}", allowed_origins);

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([CONTENT_DISPOSITION]))
}

pub fn router(state: AppState, allowed_origins: &[String]) -> AppResult<Router> {
    let cors = build_cors_layer(allowed_origins)?;

    Ok(Router::new()
        .route("/api/fetch", post(fetch::fetch_post))
        .route("/api/media-proxy/", get(media::media_proxy))
        .route("/api/media-proxy", get(media::media_proxy))
        .route("/health", get(health::health))
        .layer(cors)
        .with_state(state))
}
