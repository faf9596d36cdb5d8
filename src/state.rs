use std::sync::Arc;

use crate::{
    config::{AppConfig, ErrorDetailMode},
    error::AppResult,
    platform::{InstagramSession, PostProvider},
    service::{MediaProxy, MetadataFetcher},
};

/// Everything a request handler needs. Built once at startup; cloning only
/// bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<MetadataFetcher>,
    pub media_proxy: Arc<MediaProxy>,
    pub error_detail: ErrorDetailMode,
}

impl AppState {
    pub fn new(fetcher: MetadataFetcher, media_proxy: MediaProxy, error_detail: ErrorDetailMode) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            media_proxy: Arc::new(media_proxy),
            error_detail,
        }
    }

    pub async fn init(config: &AppConfig) -> AppResult<Self> {
        info!("Initializing Instagram session...");
        let session = InstagramSession::establish(&config.instagram, &config.session).await?;

        match session.username() {
            Some(username) => info!("Instagram session ready, logged in as {}", username),
            None => info!("Instagram session ready, anonymous"),
        }

        let provider: Arc<dyn PostProvider> = Arc::new(session);
        let fetcher = MetadataFetcher::new(provider, config.instagram.connection_policy);

        info!(
            "{} fetcher using {:?} policy (authenticated: {})",
            fetcher.provider().platform_name(),
            config.instagram.connection_policy,
            fetcher.provider().is_authenticated()
        );

        let media_proxy = MediaProxy::new(&config.proxy)?;

        Ok(Self::new(fetcher, media_proxy, config.server.error_detail))
    }
}
