#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Login failed: Bad credentials")]
    BadCredentials,
    #[error("Two-factor authentication required")]
    TwoFactorRequired,
    #[error("Checkpoint verification required: {0}")]
    CheckpointRequired(String),
    #[error("Login failed: {0}")]
    LoginFailed(String),
    #[error("Session file error: {0}")]
    SessionFile(String),
}

#[derive(Debug, thiserror::Error)]
pub enum InstagramError {
    #[error("Invalid Instagram URL: {0}")]
    InvalidUrl(String),
    #[error("Post not found: {0}")]
    NotFound(String),
    #[error("Post is private: {0}")]
    PrivatePost(String),
    #[error("Rate limited: {0}")]
    RateLimited(String),
    #[error("Login required: {0}")]
    LoginRequired(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Auth error: {0}")]
    AuthenticationError(#[from] AuthenticationError),
    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

impl InstagramError {
    /// Failures that look like Instagram refusing or throttling the connection
    /// rather than a verdict about the post itself.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::LoginRequired(_) | Self::Connection(_) => true,
            Self::NetworkError(e) => !e.is_decode() && !e.is_builder(),
            _ => false,
        }
    }
}
