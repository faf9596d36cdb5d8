use reqwest::{Client, Response};
use url::Url;

use crate::{config::ProxyConfig, service::http::create_media_client};

const FALLBACK_FILENAME: &str = "download.bin";

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("invalid media URL '{0}'")]
    InvalidUrl(String),
    #[error(transparent)]
    Upstream(#[from] reqwest::Error),
}

/// Opens upstream media for relaying. The body is never buffered here.
pub struct MediaProxy {
    client: Client,
}

impl MediaProxy {
    pub fn new(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: create_media_client(config.connect_timeout, config.read_timeout)?,
        })
    }

    pub async fn open(&self, url: &str) -> Result<Response, ProxyError> {
        let url = Url::parse(url).map_err(|_| ProxyError::InvalidUrl(url.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProxyError::InvalidUrl(url.to_string()));
        }

        debug!("Opening upstream media {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;

        Ok(response)
    }
}

/// `attachment` disposition with an ASCII fallback name and the exact name
/// percent-encoded in `filename*`.
pub fn content_disposition(filename: &str) -> String {
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitize_ascii_filename(filename),
        urlencoding::encode(filename)
    )
}

fn sanitize_ascii_filename(value: &str) -> String {
    let sanitized: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ' | '(' | ')') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let compact = sanitized.trim();
    if compact.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        compact.to_string()
    }
}
