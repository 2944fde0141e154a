//! API response type definitions for the tweet detail endpoint.

use serde::Deserialize;

/// Top-level GraphQL envelope.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<ApiErrorMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorMessage {
    pub message: String,
}

/// `data` payload of TweetResultByRestId.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetResultData {
    pub tweet_result: Option<TweetResultWrapper>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TweetResultWrapper {
    pub result: Option<TweetResult>,
}

/// A tweet, or a visibility wrapper around one.
#[derive(Debug, Clone, Deserialize)]
pub struct TweetResult {
    #[serde(rename = "__typename")]
    pub typename: Option<String>,
    pub rest_id: Option<String>,
    pub core: Option<TweetCore>,
    pub legacy: Option<TweetLegacy>,
    /// Present on `TweetWithVisibilityResults`.
    pub tweet: Option<Box<TweetResult>>,
}

impl TweetResult {
    /// Unwrap `TweetWithVisibilityResults` to the inner tweet.
    pub fn resolved(&self) -> &TweetResult {
        match &self.tweet {
            Some(inner) if self.legacy.is_none() => inner.resolved(),
            _ => self,
        }
    }

    pub fn tweet_id(&self) -> Option<&str> {
        self.rest_id
            .as_deref()
            .or_else(|| self.legacy.as_ref().and_then(|l| l.id_str.as_deref()))
    }

    pub fn screen_name(&self) -> Option<&str> {
        let user = self.core.as_ref()?.user_results.as_ref()?.result.as_ref()?;
        user.core
            .as_ref()
            .and_then(|c| c.screen_name.as_deref())
            .or_else(|| user.legacy.as_ref().and_then(|l| l.screen_name.as_deref()))
    }

    pub fn media(&self) -> &[ApiMedia] {
        self.legacy
            .as_ref()
            .and_then(|l| l.extended_entities.as_ref())
            .map(|e| e.media.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TweetCore {
    pub user_results: Option<UserResults>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserResults {
    pub result: Option<UserResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserResult {
    pub core: Option<UserCore>,
    pub legacy: Option<UserLegacy>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCore {
    pub screen_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserLegacy {
    pub screen_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TweetLegacy {
    pub id_str: Option<String>,
    pub full_text: Option<String>,
    pub extended_entities: Option<ExtendedEntities>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtendedEntities {
    #[serde(default)]
    pub media: Vec<ApiMedia>,
}

/// One attachment of a tweet.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMedia {
    pub id_str: String,
    pub media_key: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub media_url_https: String,
    pub original_info: Option<OriginalInfo>,
    pub video_info: Option<VideoInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OriginalInfo {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub aspect_ratio: Vec<u32>,
    #[serde(default)]
    pub variants: Vec<VideoVariant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoVariant {
    pub bitrate: Option<u64>,
    pub content_type: String,
    pub url: String,
}

/// Media of one tweet, as returned by a [`TweetMediaSource`](crate::api::TweetMediaSource).
#[derive(Debug, Clone, Default)]
pub struct TweetMedia {
    pub tweet_id: String,
    pub screen_name: Option<String>,
    pub media: Vec<ApiMedia>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_visibility_wrapped_tweet() {
        let json = r#"{
          "data": {"tweetResult": {"result": {
            "__typename": "TweetWithVisibilityResults",
            "tweet": {
              "rest_id": "99",
              "core": {"user_results": {"result": {"legacy": {"screen_name": "alice"}}}},
              "legacy": {"id_str": "99", "extended_entities": {"media": [
                {"id_str": "1", "type": "photo", "media_url_https": "https://pbs.twimg.com/media/A.jpg",
                 "original_info": {"width": 1200, "height": 800}}
              ]}}
            }
          }}}
        }"#;

        let response: ApiResponse<TweetResultData> = serde_json::from_str(json).unwrap();
        let result = response
            .data
            .and_then(|d| d.tweet_result)
            .and_then(|w| w.result)
            .unwrap();
        let tweet = result.resolved();

        assert_eq!(tweet.tweet_id(), Some("99"));
        assert_eq!(tweet.screen_name(), Some("alice"));
        assert_eq!(tweet.media().len(), 1);
        assert_eq!(tweet.media()[0].kind, "photo");
    }

    #[test]
    fn test_parse_error_envelope() {
        let json = r#"{"errors": [{"message": "Rate limit exceeded"}]}"#;
        let response: ApiResponse<TweetResultData> = serde_json::from_str(json).unwrap();
        assert!(response.data.is_none());
        assert_eq!(response.errors[0].message, "Rate limit exceeded");
    }
}
