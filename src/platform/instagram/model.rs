use serde::{Deserialize, Serialize};

/// Normalized post metadata returned to callers of `/api/fetch`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostMetadata {
    pub shortcode: String,
    pub owner: String,
    pub url: String,
    pub is_video: bool,
    pub display_url: String,
    pub video_url: Option<String>,
    pub caption: String,
    pub likes: u64,
    pub comments: u64,
}

// --- GraphQL response ---
//
// Every field is optional: Instagram drops keys depending on the media type,
// the viewer and the rollout of the day.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphQLResponse {
    #[serde(default)]
    pub data: Option<GraphQLData>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub require_login: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphQLData {
    #[serde(default)]
    pub xdt_shortcode_media: Option<XDTShortcodeMedia>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct XDTShortcodeMedia {
    #[serde(rename = "__typename", default)]
    pub typename: Option<String>,
    #[serde(default)]
    pub shortcode: Option<String>,
    #[serde(default)]
    pub owner: Option<Owner>,
    #[serde(default)]
    pub is_video: Option<bool>,
    #[serde(default)]
    pub display_url: Option<String>,
    #[serde(default)]
    pub display_resources: Option<Vec<DisplayResource>>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub edge_media_to_caption: Option<Edges<CaptionNode>>,
    #[serde(default)]
    pub edge_media_preview_like: Option<Count>,
    #[serde(default)]
    pub edge_liked_by: Option<Count>,
    #[serde(default)]
    pub edge_media_to_parent_comment: Option<Count>,
    #[serde(default)]
    pub edge_media_preview_comment: Option<Count>,
    #[serde(default)]
    pub edge_media_to_comment: Option<Count>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Owner {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub followed_by_viewer: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayResource {
    #[serde(default)]
    pub src: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edges<T> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptionNode {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Count {
    #[serde(default)]
    pub count: Option<u64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl XDTShortcodeMedia {
    fn display_url(&self) -> Option<String> {
        non_empty(self.display_url.clone()).or_else(|| {
            self.display_resources
                .as_ref()
                .and_then(|resources| resources.iter().find_map(|r| non_empty(r.src.clone())))
        })
    }

    fn video_url(&self) -> Option<String> {
        non_empty(self.video_url.clone())
    }

    /// A private account we do not follow still yields the envelope of the
    /// post, but none of the media.
    pub fn is_hidden_private(&self) -> bool {
        let owner_private = self.owner.as_ref().and_then(|o| o.is_private).unwrap_or(false);
        let followed = self.owner.as_ref().and_then(|o| o.followed_by_viewer).unwrap_or(false);

        owner_private && !followed && self.display_url().is_none() && self.video_url().is_none()
    }

    /// Applies the per-field defaults and builds the public record.
    pub fn into_metadata(self, requested_shortcode: &str, canonical_url: impl FnOnce(&str) -> String) -> PostMetadata {
        let display_url = self.display_url().unwrap_or_default();
        let video_url = self.video_url();

        let shortcode = non_empty(self.shortcode).unwrap_or_else(|| requested_shortcode.to_string());

        let is_video = self
            .is_video
            .unwrap_or_else(|| self.typename.as_deref() == Some("XDTGraphVideo"));

        let caption = self
            .edge_media_to_caption
            .and_then(|captions| captions.edges.into_iter().find_map(|edge| edge.node.text))
            .unwrap_or_default();

        let likes = [self.edge_media_preview_like, self.edge_liked_by]
            .into_iter()
            .find_map(|c| c.and_then(|c| c.count))
            .unwrap_or(0);

        let comments = [
            self.edge_media_to_parent_comment,
            self.edge_media_preview_comment,
            self.edge_media_to_comment,
        ]
        .into_iter()
        .find_map(|c| c.and_then(|c| c.count))
        .unwrap_or(0);

        PostMetadata {
            url: canonical_url(&shortcode),
            owner: self.owner.and_then(|o| o.username).unwrap_or_default(),
            shortcode,
            is_video,
            display_url,
            video_url,
            caption,
            likes,
            comments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canonical(shortcode: &str) -> String {
        format!("https://www.instagram.com/p/{}/", shortcode)
    }

    fn media_from(value: serde_json::Value) -> XDTShortcodeMedia {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_full_video_record() {
        let media = media_from(json!({
            "__typename": "XDTGraphVideo",
            "shortcode": "C1a2B3",
            "owner": { "username": "natgeo", "is_private": false },
            "is_video": true,
            "display_url": "https://cdn.example/thumb.jpg",
            "video_url": "https://cdn.example/clip.mp4",
            "edge_media_to_caption": { "edges": [{ "node": { "text": "hello" } }] },
            "edge_media_preview_like": { "count": 120 },
            "edge_media_to_parent_comment": { "count": 7 }
        }));

        let metadata = media.into_metadata("C1a2B3", canonical);

        assert_eq!(
            metadata,
            PostMetadata {
                shortcode: "C1a2B3".into(),
                owner: "natgeo".into(),
                url: "https://www.instagram.com/p/C1a2B3/".into(),
                is_video: true,
                display_url: "https://cdn.example/thumb.jpg".into(),
                video_url: Some("https://cdn.example/clip.mp4".into()),
                caption: "hello".into(),
                likes: 120,
                comments: 7,
            }
        );
    }

    #[test]
    fn test_missing_fields_degrade_to_defaults() {
        let metadata = media_from(json!({})).into_metadata("XYZ", canonical);

        assert_eq!(metadata.shortcode, "XYZ");
        assert_eq!(metadata.owner, "");
        assert_eq!(metadata.url, "https://www.instagram.com/p/XYZ/");
        assert!(!metadata.is_video);
        assert_eq!(metadata.display_url, "");
        assert_eq!(metadata.video_url, None);
        assert_eq!(metadata.caption, "");
        assert_eq!(metadata.likes, 0);
        assert_eq!(metadata.comments, 0);
    }

    #[test]
    fn test_fallback_fields() {
        let metadata = media_from(json!({
            "__typename": "XDTGraphVideo",
            "display_url": "",
            "display_resources": [{ "src": "" }, { "src": "https://cdn.example/640.jpg" }],
            "video_url": "",
            "edge_media_to_caption": { "edges": [] },
            "edge_liked_by": { "count": 3 },
            "edge_media_preview_comment": { "count": null },
            "edge_media_to_comment": { "count": 9 }
        }))
        .into_metadata("ABC", canonical);

        assert!(metadata.is_video);
        assert_eq!(metadata.display_url, "https://cdn.example/640.jpg");
        assert_eq!(metadata.video_url, None);
        assert_eq!(metadata.caption, "");
        assert_eq!(metadata.likes, 3);
        assert_eq!(metadata.comments, 9);
    }

    #[test]
    fn test_hidden_private_media() {
        let hidden = media_from(json!({
            "owner": { "username": "someone", "is_private": true, "followed_by_viewer": false }
        }));
        assert!(hidden.is_hidden_private());

        let followed = media_from(json!({
            "owner": { "username": "someone", "is_private": true, "followed_by_viewer": true }
        }));
        assert!(!followed.is_hidden_private());

        let visible = media_from(json!({
            "owner": { "username": "someone", "is_private": true },
            "display_url": "https://cdn.example/a.jpg"
        }));
        assert!(!visible.is_hidden_private());
    }

    #[test]
    fn test_metadata_json_shape() {
        let metadata = media_from(json!({ "shortcode": "ABC" })).into_metadata("ABC", canonical);
        let value = serde_json::to_value(&metadata).unwrap();

        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "caption",
                "comments",
                "display_url",
                "is_video",
                "likes",
                "owner",
                "shortcode",
                "url",
                "video_url"
            ]
        );
        assert!(value["video_url"].is_null());
    }
}
