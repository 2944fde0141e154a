//! Media extraction service: tweet resolution, strategy chain and cache.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::ExtractionMode;
use crate::dom::selectors::{find_tweet_container, is_media_image, is_media_video, video_source};
use crate::dom::Element;
use crate::events::{EventBus, GalleryEvent};
use crate::extraction::chain::{StrategyChain, StrategyChainMetrics};
use crate::extraction::strategies::scan_container;
use crate::extraction::tweet_info::TweetInfoExtractor;
use crate::extraction::types::{
    ExtractionContext, ExtractionError, ExtractionErrorKind, ExtractionResult, SourceType,
};
use crate::media::find_clicked_index;
use crate::media::url::normalize_image_url;

/// Per-call options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractionOptions {
    pub mode: ExtractionMode,
}

impl ExtractionOptions {
    pub fn new(mode: ExtractionMode) -> Self {
        Self { mode }
    }
}

type CacheKey = (String, ExtractionMode);

/// Entry point for turning a click into an [`ExtractionResult`].
///
/// Successful chain results are cached per tweet and mode for the lifetime
/// of the service; the clicked position is re-derived on every call.
pub struct MediaExtractionService {
    tweet_info: Arc<dyn TweetInfoExtractor>,
    chain: StrategyChain,
    events: EventBus,
    cache: RwLock<HashMap<CacheKey, ExtractionResult>>,
    last_metrics: RwLock<Option<StrategyChainMetrics>>,
}

impl MediaExtractionService {
    pub fn new(
        tweet_info: Arc<dyn TweetInfoExtractor>,
        chain: StrategyChain,
        events: EventBus,
    ) -> Self {
        Self {
            tweet_info,
            chain,
            events,
            cache: RwLock::new(HashMap::new()),
            last_metrics: RwLock::new(None),
        }
    }

    /// Extract media for the tweet containing `element`.
    pub async fn extract_from_clicked_element(
        &self,
        element: &Element,
        options: ExtractionOptions,
    ) -> ExtractionResult {
        self.extract(element, options, false).await
    }

    /// Extract every media item of a tweet container, with no clicked item.
    pub async fn extract_all_from_container(
        &self,
        container: &Element,
        options: ExtractionOptions,
    ) -> ExtractionResult {
        self.extract(container, options, true).await
    }

    /// Forget all cached results.
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        debug!(entries = cache.len(), "Clearing extraction cache");
        cache.clear();
    }

    pub async fn cache_len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Chain metrics of the most recent uncached run.
    pub async fn last_metrics(&self) -> Option<StrategyChainMetrics> {
        self.last_metrics.read().await.clone()
    }

    async fn extract(
        &self,
        element: &Element,
        options: ExtractionOptions,
        whole_container: bool,
    ) -> ExtractionResult {
        let ctx = ExtractionContext::new(element.clone(), options.mode);
        let correlation_id = ctx.correlation_id.clone();

        self.events.emit(GalleryEvent::ExtractionStarted {
            correlation_id: correlation_id.clone(),
            timestamp: Utc::now(),
        });

        let tweet = match self.tweet_info.extract(element).await {
            Ok(info) => info,
            Err(e) => {
                warn!(correlation_id = %correlation_id, error = %e, "Tweet info extraction failed");
                let result = ExtractionResult::failed(
                    SourceType::ExtractionFailed,
                    vec![ExtractionError::new(ExtractionErrorKind::NoTweetInfo, e.to_string())],
                );
                self.emit_outcome(&correlation_id, &result);
                return result;
            }
        };

        let key: CacheKey = (tweet.tweet_id.clone(), options.mode);
        let cached = self.cache.read().await.get(&key).cloned();

        let raw = match cached {
            Some(mut hit) => {
                debug!(correlation_id = %correlation_id, tweet_id = %tweet.tweet_id, "Extraction cache hit");
                hit.metadata.cache_hit = true;
                hit.metadata.attempts = 0;
                hit.metadata.retries = 0;
                hit
            }
            None => {
                let ctx = ctx.with_tweet_info(tweet.clone());
                let outcome = self.chain.run(&ctx).await;
                *self.last_metrics.write().await = Some(outcome.metrics);

                if outcome.result.success {
                    self.cache.write().await.insert(key, outcome.result.clone());
                }
                outcome.result
            }
        };

        let mut result = if whole_container {
            let mut result = dedupe(raw);
            result.clicked_index = 0;
            result
        } else {
            locate_clicked(dedupe(raw), element)
        };

        if options.mode == ExtractionMode::Single
            && result.success
            && result.clicked_index < result.media_items.len()
        {
            let clicked = result.media_items.swap_remove(result.clicked_index);
            result.media_items = vec![clicked];
            result.clicked_index = 0;
        }

        result.tweet_info = Some(tweet);
        result.refresh_success();

        info!(
            correlation_id = %correlation_id,
            success = result.success,
            media = result.media_items.len(),
            clicked_index = result.clicked_index,
            source = %result.metadata.source_type,
            cache_hit = result.metadata.cache_hit,
            "Extraction finished"
        );
        self.emit_outcome(&correlation_id, &result);
        result
    }

    fn emit_outcome(&self, correlation_id: &str, result: &ExtractionResult) {
        let event = if result.success {
            GalleryEvent::ExtractionCompleted {
                correlation_id: correlation_id.to_string(),
                media_count: result.media_items.len(),
                source: result.metadata.source_type.to_string(),
                cache_hit: result.metadata.cache_hit,
                timestamp: Utc::now(),
            }
        } else {
            GalleryEvent::ExtractionFailed {
                correlation_id: correlation_id.to_string(),
                error: result
                    .errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
                timestamp: Utc::now(),
            }
        };
        self.events.emit(event);
    }
}

/// Drop repeated URLs, keeping the first occurrence and tracking the
/// clicked item to its new position.
fn dedupe(mut result: ExtractionResult) -> ExtractionResult {
    let clicked_url = result
        .media_items
        .get(result.clicked_index)
        .map(|item| item.url.clone());

    let mut seen = HashSet::new();
    result.media_items.retain(|item| seen.insert(item.url.clone()));

    result.clicked_index = clicked_url
        .and_then(|url| result.media_items.iter().position(|item| item.url == url))
        .unwrap_or(0);
    result
}

/// Point `clicked_index` at the item the user actually clicked, when the
/// click can be tied to a media URL.
fn locate_clicked(mut result: ExtractionResult, element: &Element) -> ExtractionResult {
    if result.media_items.is_empty() {
        return result;
    }

    if let Some(index) = clicked_media_urls(element)
        .iter()
        .find_map(|url| find_clicked_index(&result.media_items, url))
    {
        result.clicked_index = index;
    }
    result
}

/// Candidate URLs for the clicked media, most specific first.
fn clicked_media_urls(element: &Element) -> Vec<String> {
    let mut urls = Vec::new();

    let media = if is_media_image(element) || is_media_video(element) {
        Some(element.clone())
    } else {
        element.find_first(|el| is_media_image(el) || is_media_video(el))
    };

    if let Some(media) = media {
        urls.extend(element_urls(&media));
    }

    // Overlays and play buttons: resolve through the rendered tweet.
    if let Some(container) = find_tweet_container(element) {
        let (items, index) = scan_container(&container, Some(element), None);
        if let Some(item) = items.get(index) {
            urls.push(item.url.clone());
            urls.extend(item.thumbnail_url.clone());
        }
    }

    urls
}

fn element_urls(el: &Element) -> Vec<String> {
    let mut urls = Vec::new();
    if el.tag() == "img" {
        urls.extend(el.attr("src").map(normalize_image_url));
    } else {
        urls.extend(video_source(el));
        urls.extend(el.attr("poster").map(str::to_string));
    }
    urls
}
