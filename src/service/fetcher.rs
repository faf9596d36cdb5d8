use std::sync::Arc;

use crate::{
    config::ConnectionPolicy,
    platform::{InstagramError, PostMetadata, PostProvider},
};

/// Upper bound on anonymous retries after a connection-type failure.
const MAX_ANONYMOUS_RETRIES: usize = 1;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Post not found: {0}")]
    NotFound(String),
    #[error("Private post: {0}")]
    Private(String),
    #[error("Instagram blocked the request: {0}")]
    RateLimited(InstagramError),
    #[error("Anonymous retry failed: {0}")]
    RetryExhausted(InstagramError),
    #[error("Unexpected error: {0}")]
    Unexpected(InstagramError),
}

impl FetchError {
    /// Outcome for failures that say something about the post itself.
    fn from_verdict(error: InstagramError) -> Self {
        match error {
            InstagramError::NotFound(shortcode) => Self::NotFound(shortcode),
            InstagramError::PrivatePost(shortcode) => Self::Private(shortcode),
            other => Self::Unexpected(other),
        }
    }
}

/// Resolves shortcodes through the shared session, applying the configured
/// connection policy.
pub struct MetadataFetcher {
    provider: Arc<dyn PostProvider>,
    policy: ConnectionPolicy,
}

impl MetadataFetcher {
    pub fn new(provider: Arc<dyn PostProvider>, policy: ConnectionPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn provider(&self) -> &dyn PostProvider {
        self.provider.as_ref()
    }

    pub async fn fetch(&self, shortcode: &str) -> Result<PostMetadata, FetchError> {
        let error = match self.provider.fetch_post(shortcode).await {
            Ok(metadata) => return Ok(metadata),
            Err(e) => e,
        };

        if !error.is_connection_error() {
            return Err(FetchError::from_verdict(error));
        }

        warn!("Connection issue / rate-limit while fetching {}: {}", shortcode, error);

        match self.policy {
            ConnectionPolicy::Surface => Err(FetchError::RateLimited(error)),
            ConnectionPolicy::RetryAnonymous => self.retry_anonymously(shortcode, error).await,
        }
    }

    async fn retry_anonymously(&self, shortcode: &str, first_error: InstagramError) -> Result<PostMetadata, FetchError> {
        let mut last_error = first_error;

        for attempt in 1..=MAX_ANONYMOUS_RETRIES {
            info!(
                "Retrying {} with a fresh anonymous session ({}/{})",
                shortcode, attempt, MAX_ANONYMOUS_RETRIES
            );

            // Request-local: the shared session is never touched.
            let session = match self.provider.fresh_anonymous() {
                Ok(session) => session,
                Err(e) => {
                    last_error = e;
                    break;
                }
            };

            match session.fetch_post(shortcode).await {
                Ok(metadata) => return Ok(metadata),
                Err(e) if e.is_connection_error() => {
                    warn!("Anonymous retry for {} failed: {}", shortcode, e);
                    last_error = e;
                }
                Err(e) => return Err(FetchError::from_verdict(e)),
            }
        }

        Err(FetchError::RetryExhausted(last_error))
    }
}
