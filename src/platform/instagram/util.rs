use std::sync::LazyLock;

use anyhow::Context;
use regex::Regex;
use url::Url;

use super::InstagramError;

/// Path prefixes that point at a single post.
const POST_PREFIXES: [&str; 2] = ["p", "reel"];

static CSRF_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""csrf_token"\s*:\s*"([A-Za-z0-9_\-]+)""#)
        .context("Failed to create CSRF token regex")
        .unwrap()
});

/// Extracts the shortcode from a post or reel URL such as
/// `https://www.instagram.com/reel/C1a2B3c4D5e/?igsh=...`.
///
/// Never touches the network and never panics, whatever the input.
pub fn parse_shortcode(url_str: &str) -> Result<String, InstagramError> {
    let url = Url::parse(url_str.trim()).map_err(|_| InstagramError::InvalidUrl(url_str.to_string()))?;

    let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        [prefix, shortcode, ..] if POST_PREFIXES.contains(prefix) => Ok(shortcode.to_string()),
        _ => Err(InstagramError::InvalidUrl(url_str.to_string())),
    }
}

pub fn canonical_post_url(base_url: &Url, shortcode: &str) -> String {
    let origin = base_url.origin().ascii_serialization();
    format!("{}/p/{}/", origin, shortcode)
}

/// Instagram embeds the csrf token in the homepage markup when the cookie is
/// not handed out directly.
pub fn extract_csrf_token(html: &str) -> Option<String> {
    CSRF_TOKEN_REGEX
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
