mod auth;
mod error;
pub mod model;
mod util;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use url::Url;

pub use error::*;
pub use model::PostMetadata;
pub use util::*;

use crate::{
    config::{InstagramConfig, SessionConfig},
    service::http::HttpService,
};

use super::traits::PostProvider;
use model::GraphQLResponse;

const GRAPHQL_PATH: &str = "graphql/query/";
const LOGIN_PATH_PREFIX: &str = "/accounts/login";

/// A client context for Instagram, anonymous or logged in.
///
/// Built once at startup and shared read-only between requests.
pub struct InstagramSession {
    http_service: HttpService,
    config: InstagramConfig,
    username: Option<String>,
    authenticated: bool,
}

impl InstagramSession {
    /// A session with no credentials and no proxy.
    pub fn anonymous(config: &InstagramConfig) -> Result<Self, InstagramError> {
        Self::build(config, None)
    }

    fn build(config: &InstagramConfig, proxy: Option<&str>) -> Result<Self, InstagramError> {
        let http_service = HttpService::new(&config.base_url, config.timeout, config.connect_timeout, proxy)?;

        Ok(Self {
            http_service,
            config: config.clone(),
            username: None,
            authenticated: false,
        })
    }

    /// Sets up the process-wide session.
    ///
    /// A stored session file wins over username/password. Any failure to
    /// authenticate is logged and the session stays anonymous; only a broken
    /// client configuration (e.g. an unusable proxy URL) is an error.
    pub async fn establish(config: &InstagramConfig, session: &SessionConfig) -> Result<Self, InstagramError> {
        let proxy = session.proxy.as_deref();
        let mut instagram = Self::build(config, proxy)?;

        if let Some(path) = session.session_file.as_deref() {
            if tokio::fs::try_exists(path).await.unwrap_or(false) {
                match auth::load_session_file(path, &instagram.http_service.cookie_jar(), &config.base_url).await {
                    Ok(stored_username) => {
                        instagram.username = stored_username.or_else(|| session.username.clone());
                        instagram.authenticated = true;
                        info!("Loaded Instagram session from {}", path);
                    }
                    Err(e) => {
                        warn!("Failed to load session file {}: {}, continuing anonymously", path, e);
                        instagram = Self::build(config, proxy)?;
                    }
                }
                return Ok(instagram);
            }
            info!("Session file {} not found", path);
        }

        if let (Some(username), Some(password)) = (session.username.as_deref(), session.password.as_deref()) {
            info!("Logging in to Instagram as {}", username);
            match auth::login(&instagram.http_service, &config.base_url, username, password).await {
                Ok(()) => {
                    instagram.username = Some(username.to_string());
                    instagram.authenticated = true;
                    if let Some(path) = session.session_file.as_deref() {
                        if let Err(e) =
                            auth::save_session_file(path, username, &instagram.http_service.cookie_jar(), &config.base_url)
                                .await
                        {
                            warn!("Failed to save session file {}: {}", path, e);
                        }
                    }
                }
                Err(e) => {
                    warn!("Instagram login failed: {}, continuing anonymously", e);
                    instagram = Self::build(config, proxy)?;
                }
            }
        }

        Ok(instagram)
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    fn graphql_url(&self) -> Result<Url, InstagramError> {
        self.config
            .base_url
            .join(GRAPHQL_PATH)
            .map_err(|e| InstagramError::Unexpected(format!("Failed to build GraphQL URL: {}", e)))
    }

    fn check_status(response: &Response) -> Result<(), InstagramError> {
        if response.url().path().starts_with(LOGIN_PATH_PREFIX) {
            return Err(InstagramError::LoginRequired(format!(
                "redirected to {}",
                response.url().path()
            )));
        }

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(InstagramError::NotFound(format!("HTTP {}", StatusCode::NOT_FOUND))),
            StatusCode::TOO_MANY_REQUESTS => Err(InstagramError::RateLimited(format!(
                "HTTP {}",
                StatusCode::TOO_MANY_REQUESTS
            ))),
            StatusCode::UNAUTHORIZED => Err(InstagramError::LoginRequired(format!(
                "HTTP {}",
                StatusCode::UNAUTHORIZED
            ))),
            status => Err(InstagramError::Connection(format!("HTTP error code {}", status))),
        }
    }
}

#[async_trait]
impl PostProvider for InstagramSession {
    fn platform_name(&self) -> &str {
        "Instagram"
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    async fn fetch_post(&self, shortcode: &str) -> Result<PostMetadata, InstagramError> {
        let variables = serde_json::json!({ "shortcode": shortcode }).to_string();
        let query = [
            ("doc_id", self.config.doc_id.as_str()),
            ("variables", variables.as_str()),
            ("server_timestamps", "true"),
        ];

        debug!("Querying post metadata for {}", shortcode);

        let response = self.http_service.get_with_query(self.graphql_url()?, &query).await?;

        Self::check_status(&response)?;

        // Instagram blocks scrapers with an HTML login page served as 200.
        let parsed: GraphQLResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                InstagramError::Connection(format!("GraphQL response is not JSON: {}", e))
            } else {
                InstagramError::NetworkError(e)
            }
        })?;

        if parsed.status.as_deref() == Some("fail") {
            let message = parsed.message.unwrap_or_else(|| "request failed".to_string());
            if message.to_lowercase().contains("wait") {
                return Err(InstagramError::RateLimited(message));
            }
            if parsed.require_login == Some(true) {
                return Err(InstagramError::LoginRequired(message));
            }
            return Err(InstagramError::Connection(message));
        }

        let media = match parsed.data.and_then(|d| d.xdt_shortcode_media) {
            Some(media) => media,
            None if parsed.require_login == Some(true) => {
                return Err(InstagramError::PrivatePost(shortcode.to_string()));
            }
            None => return Err(InstagramError::NotFound(shortcode.to_string())),
        };

        if media.is_hidden_private() {
            return Err(InstagramError::PrivatePost(shortcode.to_string()));
        }

        let base_url = &self.config.base_url;
        Ok(media.into_metadata(shortcode, |code| canonical_post_url(base_url, code)))
    }

    fn fresh_anonymous(&self) -> Result<Box<dyn PostProvider>, InstagramError> {
        Ok(Box::new(Self::anonymous(&self.config)?))
    }
}
