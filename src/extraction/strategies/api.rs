//! Strategy backed by the tweet detail API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::TweetMediaSource;
use crate::error::{Error, Result};
use crate::extraction::strategy::ExtractionStrategy;
use crate::extraction::types::{ExtractionContext, ExtractionResult, SourceType};
use crate::media::parse_tweet_media;

pub const API_STRATEGY_NAME: &str = "api-first";

/// Fetches the full attachment list of the clicked tweet.
pub struct ApiStrategy {
    source: Arc<dyn TweetMediaSource>,
    timeout: Duration,
}

impl ApiStrategy {
    pub fn new(source: Arc<dyn TweetMediaSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }
}

#[async_trait]
impl ExtractionStrategy for ApiStrategy {
    fn name(&self) -> &str {
        API_STRATEGY_NAME
    }

    fn can_handle(&self, context: &ExtractionContext) -> bool {
        context.tweet_id().is_some()
    }

    async fn extract(&self, context: &ExtractionContext) -> Result<ExtractionResult> {
        let tweet_id = context
            .tweet_id()
            .ok_or_else(|| Error::Extraction("missing tweet id".into()))?;

        let tweet = tokio::time::timeout(self.timeout, self.source.fetch_tweet_media(tweet_id))
            .await
            .map_err(|_| Error::Timeout)??;

        let mut items = parse_tweet_media(&tweet);
        if let Some(username) = context.tweet_info.as_ref().and_then(|i| i.username.clone()) {
            for item in items.iter_mut().filter(|i| i.tweet_username.is_none()) {
                item.tweet_username = Some(username.clone());
            }
        }

        tracing::debug!(tweet_id, media = items.len(), "Tweet API returned media");
        Ok(ExtractionResult::succeeded(items, 0, SourceType::Api))
    }
}
