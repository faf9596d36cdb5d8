use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{config::ErrorDetailMode, service::FetchError};

const GENERIC_DETAIL: &str = "Internal server error";

/// Error surfaced to HTTP callers as `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    pub fn from_fetch_error(error: FetchError, mode: ErrorDetailMode) -> Self {
        match error {
            FetchError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Post not found."),
            FetchError::Private(_) => Self::new(
                StatusCode::FORBIDDEN,
                "Private post. Cannot fetch without login or following the account.",
            ),
            FetchError::RateLimited(_) => Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                "Instagram temporarily blocked this request. Try again later.",
            ),
            error @ (FetchError::RetryExhausted(_) | FetchError::Unexpected(_)) => {
                error!("Unexpected error: {}", error);
                error!("{:?}", error);
                match mode {
                    ErrorDetailMode::Hardened => Self::internal(GENERIC_DETAIL),
                    ErrorDetailMode::Permissive => Self::internal(error.to_string()),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
