use crate::platform::InstagramError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Instagram error: {0}")]
    InstagramError(#[from] InstagramError),

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("Invalid CORS origin: {0}")]
    InvalidOrigin(String),
}

pub type AppResult<T> = Result<T, AppError>;
