use async_trait::async_trait;

use super::instagram::{InstagramError, PostMetadata};

/// Something that can resolve a shortcode into post metadata.
#[async_trait]
pub trait PostProvider: Send + Sync {
    fn platform_name(&self) -> &str;

    fn is_authenticated(&self) -> bool;

    async fn fetch_post(&self, shortcode: &str) -> Result<PostMetadata, InstagramError>;

    /// Builds a brand new session without credentials or proxy, sharing
    /// nothing with `self`.
    fn fresh_anonymous(&self) -> Result<Box<dyn PostProvider>, InstagramError>;
}
