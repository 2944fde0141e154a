//! Tweet detail API HTTP client.

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde_json::json;
use tokio::sync::RwLock;
use url::Url;

use crate::api::types::*;
use crate::config::Config;
use crate::error::{Error, Result};

/// Site the GraphQL endpoint is served from.
const API_BASE: &str = "https://x.com";

/// Guest token activation endpoint.
const GUEST_ACTIVATE_URL: &str = "https://api.x.com/1.1/guest/activate.json";

/// Operation identifier of the TweetResultByRestId query.
pub const TWEET_RESULT_BY_REST_ID_QUERY_ID: &str = "zAz9764BcLZOJ0JU2wrd1A";

/// Source of a tweet's media attachments.
#[async_trait]
pub trait TweetMediaSource: Send + Sync {
    async fn fetch_tweet_media(&self, tweet_id: &str) -> Result<TweetMedia>;
}

/// Session cookies and bearer token used to authorize requests.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub bearer_token: String,
    pub auth_token: Option<String>,
    pub csrf_token: Option<String>,
}

impl ApiCredentials {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bearer_token: config.account.bearer_token.clone(),
            auth_token: config.account.auth_token.clone(),
            csrf_token: config.account.csrf_token.clone(),
        }
    }

    /// Logged-in session (cookie pair) rather than guest access.
    pub fn is_session(&self) -> bool {
        self.auth_token.is_some() && self.csrf_token.is_some()
    }
}

/// Client for the tweet detail GraphQL endpoint.
pub struct TwitterApi {
    client: Client,
    base_url: String,
    credentials: ApiCredentials,
    guest_token: RwLock<Option<String>>,
}

impl TwitterApi {
    /// Create a new API client.
    pub fn new(credentials: ApiCredentials, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: API_BASE.to_string(),
            credentials,
            guest_token: RwLock::new(None),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            ApiCredentials::from_config(config),
            &config.account.user_agent,
        )
    }

    /// Point the client at another host (used by tests and mirrors).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the TweetResultByRestId URL for a tweet.
    pub fn tweet_result_url(&self, tweet_id: &str) -> Result<Url> {
        let variables = json!({
            "tweetId": tweet_id,
            "withCommunity": false,
            "includePromotedContent": false,
            "withVoice": false,
        });
        let features = json!({
            "creator_subscriptions_tweet_preview_api_enabled": true,
            "premium_content_api_read_enabled": false,
            "communities_web_enable_tweet_community_results_fetch": true,
            "c9s_tweet_anatomy_moderator_badge_enabled": true,
            "articles_preview_enabled": true,
            "responsive_web_edit_tweet_api_enabled": true,
            "graphql_is_translatable_rweb_tweet_is_translatable_enabled": true,
            "view_counts_everywhere_api_enabled": true,
            "longform_notetweets_consumption_enabled": true,
            "responsive_web_twitter_article_tweet_consumption_enabled": true,
            "tweet_awards_web_tipping_enabled": false,
            "creator_subscriptions_quote_tweet_preview_enabled": false,
            "freedom_of_speech_not_reach_fetch_enabled": true,
            "standardized_nudges_misinfo": true,
            "tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled": true,
            "longform_notetweets_rich_text_read_enabled": true,
            "longform_notetweets_inline_media_enabled": true,
            "profile_label_improvements_pcf_label_in_post_enabled": true,
            "rweb_tipjar_consumption_enabled": true,
            "verified_phone_label_enabled": false,
            "responsive_web_graphql_skip_user_profile_image_extensions_enabled": false,
            "responsive_web_graphql_timeline_navigation_enabled": true,
            "responsive_web_enhance_cards_enabled": false,
        });
        let field_toggles = json!({
            "withArticleRichContentState": true,
            "withArticlePlainText": false,
            "withGrokAnalyze": false,
            "withDisallowedReplyControls": false,
        });

        let mut url = Url::parse(&format!(
            "{}/i/api/graphql/{}/TweetResultByRestId",
            self.base_url.trim_end_matches('/'),
            TWEET_RESULT_BY_REST_ID_QUERY_ID
        ))?;
        url.query_pairs_mut()
            .append_pair("variables", &variables.to_string())
            .append_pair("features", &features.to_string())
            .append_pair("fieldToggles", &field_toggles.to_string());

        Ok(url)
    }

    /// Build common headers for API requests.
    async fn build_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();

        insert_header(
            &mut headers,
            header::AUTHORIZATION,
            &format!("Bearer {}", self.credentials.bearer_token),
        )?;
        insert_header(&mut headers, header::CONTENT_TYPE, "application/json")?;
        insert_header(&mut headers, "x-twitter-active-user", "yes")?;
        insert_header(&mut headers, "x-twitter-client-language", "en")?;

        match (&self.credentials.auth_token, &self.credentials.csrf_token) {
            (Some(auth), Some(csrf)) => {
                insert_header(&mut headers, "x-csrf-token", csrf)?;
                insert_header(&mut headers, "x-twitter-auth-type", "OAuth2Session")?;
                insert_header(
                    &mut headers,
                    header::COOKIE,
                    &format!("auth_token={}; ct0={}", auth, csrf),
                )?;
            }
            _ => {
                let guest = self.guest_token().await?;
                insert_header(&mut headers, "x-guest-token", &guest)?;
            }
        }

        Ok(headers)
    }

    /// Guest token, activated once and reused.
    async fn guest_token(&self) -> Result<String> {
        if let Some(token) = self.guest_token.read().await.as_ref() {
            return Ok(token.clone());
        }

        tracing::debug!("Activating guest token");
        let response = self
            .client
            .post(GUEST_ACTIVATE_URL)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.credentials.bearer_token),
            )
            .send()
            .await?;
        let response = check_status(response)?;

        let body: serde_json::Value = response.json().await?;
        let token = body
            .get("guest_token")
            .and_then(|t| t.as_str())
            .ok_or_else(|| Error::Authentication("Guest activation returned no token".into()))?
            .to_string();

        *self.guest_token.write().await = Some(token.clone());
        Ok(token)
    }

    /// Make an authenticated GET request.
    async fn get(&self, url: Url) -> Result<Response> {
        let headers = self.build_headers().await?;

        tracing::debug!("GET {}", url.path());

        let response = self.client.get(url).headers(headers).send().await?;
        tracing::debug!("Response status: {}", response.status());

        check_status(response)
    }

    /// Fetch the tweet detail record for a tweet.
    pub async fn get_tweet_result(&self, tweet_id: &str) -> Result<TweetResult> {
        let url = self.tweet_result_url(tweet_id)?;
        let response = self.get(url).await?;
        let text = response.text().await?;

        let api_response: ApiResponse<TweetResultData> =
            serde_json::from_str(&text).map_err(|e| {
                Error::Api(format!("Failed to parse tweet result: {}", e))
            })?;

        if let Some(err) = api_response.errors.first() {
            if api_response.data.is_none() {
                return Err(Error::Api(err.message.clone()));
            }
        }

        api_response
            .data
            .and_then(|d| d.tweet_result)
            .and_then(|w| w.result)
            .ok_or_else(|| Error::Api(format!("Tweet {} not found", tweet_id)))
    }
}

#[async_trait]
impl TweetMediaSource for TwitterApi {
    async fn fetch_tweet_media(&self, tweet_id: &str) -> Result<TweetMedia> {
        let result = self.get_tweet_result(tweet_id).await?;
        let tweet = result.resolved();

        Ok(TweetMedia {
            tweet_id: tweet.tweet_id().unwrap_or(tweet_id).to_string(),
            screen_name: tweet.screen_name().map(str::to_string),
            media: tweet.media().to_vec(),
        })
    }
}

fn insert_header<K>(headers: &mut header::HeaderMap, name: K, value: &str) -> Result<()>
where
    K: header::IntoHeaderName,
{
    let value = header::HeaderValue::from_str(value)
        .map_err(|e| Error::Api(format!("Invalid header value: {}", e)))?;
    headers.insert(name, value);
    Ok(())
}

/// Map rate limiting, auth failures and other non-2xx statuses to errors.
fn check_status(response: Response) -> Result<Response> {
    let status = response.status();

    if status == 429 {
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);
        return Err(Error::RateLimited(retry_after));
    }

    if status == 401 || status == 403 {
        return Err(Error::Authentication(format!("HTTP {}", status)));
    }

    if !status.is_success() {
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> TwitterApi {
        TwitterApi::new(
            ApiCredentials {
                bearer_token: "token".into(),
                auth_token: None,
                csrf_token: None,
            },
            "test-agent",
        )
        .unwrap()
    }

    #[test]
    fn test_tweet_result_url_carries_variables() {
        let url = api().tweet_result_url("1790000000000000001").unwrap();

        assert_eq!(url.host_str(), Some("x.com"));
        assert!(url.path().ends_with("/TweetResultByRestId"));
        assert!(url.path().contains(TWEET_RESULT_BY_REST_ID_QUERY_ID));

        let variables = url
            .query_pairs()
            .find(|(k, _)| k == "variables")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&variables).unwrap();
        assert_eq!(parsed["tweetId"], "1790000000000000001");
        assert!(url.query_pairs().any(|(k, _)| k == "fieldToggles"));
    }

    #[test]
    fn test_base_url_override() {
        let url = api()
            .with_base_url("http://127.0.0.1:9/")
            .tweet_result_url("1")
            .unwrap();
        assert_eq!(url.host_str(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_session_headers_skip_guest_activation() {
        let api = TwitterApi::new(
            ApiCredentials {
                bearer_token: "token".into(),
                auth_token: Some("a".repeat(40)),
                csrf_token: Some("ct0".into()),
            },
            "test-agent",
        )
        .unwrap();

        let headers = api.build_headers().await.unwrap();
        assert_eq!(headers.get("x-csrf-token").unwrap(), "ct0");
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer token");
        assert!(headers.get("x-guest-token").is_none());
    }
}
