//! Media item representation.

use serde::{Deserialize, Serialize};

use crate::media::url::extension_from_url;

/// Type of media content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Gif,
}

impl MediaType {
    /// Map the API's `type` field.
    pub fn from_api_type(kind: &str) -> Option<Self> {
        match kind {
            "photo" => Some(MediaType::Image),
            "video" => Some(MediaType::Video),
            "animated_gif" => Some(MediaType::Gif),
            _ => None,
        }
    }

    /// Extension used when the URL carries none.
    pub fn default_extension(&self) -> &'static str {
        match self {
            MediaType::Image => "jpg",
            // Animated GIFs are served as MP4.
            MediaType::Video | MediaType::Gif => "mp4",
        }
    }
}

/// A downloadable media item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Unique media ID.
    pub id: String,

    /// Download URL (highest quality available).
    pub url: String,

    #[serde(rename = "type")]
    pub media_type: MediaType,

    /// Preferred filename, when the source knows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet_username: Option<String>,

    /// Preview image for videos and GIFs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl MediaItem {
    pub fn new(id: impl Into<String>, url: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            media_type,
            filename: None,
            width: None,
            height: None,
            size: None,
            tweet_id: None,
            tweet_username: None,
            thumbnail_url: None,
        }
    }

    pub fn with_tweet(mut self, info: &TweetInfo) -> Self {
        self.tweet_id = Some(info.tweet_id.clone());
        self.tweet_username = info.username.clone();
        self
    }

    pub fn with_dimensions(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_thumbnail(mut self, thumbnail_url: Option<String>) -> Self {
        self.thumbnail_url = thumbnail_url;
        self
    }

    /// Effective file extension, without the dot.
    pub fn extension(&self) -> String {
        if let Some(ext) = self
            .filename
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
        {
            return ext.to_lowercase();
        }

        extension_from_url(&self.url).unwrap_or_else(|| self.media_type.default_extension().to_string())
    }

    /// MIME type derived from the extension.
    pub fn mime_type(&self) -> String {
        mime_guess::from_ext(&self.extension())
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string()
    }
}

/// Identity of the tweet a click belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetInfo {
    pub tweet_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet_url: Option<String>,
}

impl TweetInfo {
    pub fn new(tweet_id: impl Into<String>, username: Option<String>) -> Self {
        let tweet_id = tweet_id.into();
        let tweet_url = username
            .as_ref()
            .map(|name| format!("https://x.com/{}/status/{}", name, tweet_id));
        Self {
            tweet_id,
            username,
            tweet_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_prefers_filename_then_url() {
        let mut item = MediaItem::new(
            "1",
            "https://pbs.twimg.com/media/A?format=png&name=orig",
            MediaType::Image,
        );
        assert_eq!(item.extension(), "png");
        assert_eq!(item.mime_type(), "image/png");

        item.filename = Some("custom.WEBP".into());
        assert_eq!(item.extension(), "webp");
    }

    #[test]
    fn test_gif_defaults_to_mp4() {
        let item = MediaItem::new("1", "https://video.twimg.com/tweet_video/X", MediaType::Gif);
        assert_eq!(item.extension(), "mp4");
    }

    #[test]
    fn test_tweet_info_builds_permalink() {
        let info = TweetInfo::new("123", Some("alice".into()));
        assert_eq!(info.tweet_url.as_deref(), Some("https://x.com/alice/status/123"));
        assert_eq!(TweetInfo::new("123", None).tweet_url, None);
    }

    #[test]
    fn test_serialized_type_field() {
        let item = MediaItem::new("1", "https://video.twimg.com/a.mp4", MediaType::Video);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "video");
        assert!(json.get("width").is_none());
    }
}
