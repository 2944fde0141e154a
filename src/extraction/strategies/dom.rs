//! Strategy that scans the rendered tweet for media elements.

use async_trait::async_trait;

use crate::dom::selectors::{
    find_tweet_container, is_media_image, is_media_video, is_media_wrapper, video_source,
};
use crate::dom::Element;
use crate::error::Result;
use crate::extraction::strategy::ExtractionStrategy;
use crate::extraction::types::{
    ExtractionContext, ExtractionError, ExtractionResult, SourceType,
};
use crate::media::url::{gif_url_from_thumbnail, is_video_thumbnail, media_key, normalize_image_url};
use crate::media::{MediaItem, MediaType, TweetInfo};

pub const DOM_STRATEGY_NAME: &str = "dom-scan";

/// Reads photos and directly addressable videos out of the tweet container.
#[derive(Debug, Default)]
pub struct DomScanStrategy;

impl DomScanStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExtractionStrategy for DomScanStrategy {
    fn name(&self) -> &str {
        DOM_STRATEGY_NAME
    }

    fn can_handle(&self, context: &ExtractionContext) -> bool {
        find_tweet_container(&context.element).is_some()
    }

    async fn extract(&self, context: &ExtractionContext) -> Result<ExtractionResult> {
        let Some(container) = find_tweet_container(&context.element) else {
            return Ok(ExtractionResult::failed(
                SourceType::DomScan,
                vec![ExtractionError::no_media(DOM_STRATEGY_NAME)],
            ));
        };

        let (items, clicked_index) =
            scan_container(&container, Some(&context.element), context.tweet_info.as_ref());

        tracing::debug!(media = items.len(), clicked_index, "DOM scan finished");
        Ok(ExtractionResult::succeeded(items, clicked_index, SourceType::DomScan))
    }
}

/// Collect the media of a tweet container in document order.
///
/// Returns the items and the index of the one containing (or contained by)
/// `clicked`, defaulting to 0.
pub fn scan_container(
    container: &Element,
    clicked: Option<&Element>,
    tweet: Option<&TweetInfo>,
) -> (Vec<MediaItem>, usize) {
    let mut items: Vec<MediaItem> = Vec::new();
    let mut clicked_index = None;

    let candidates = container.find_all(|el| is_media_image(el) || is_media_video(el));

    for el in candidates {
        // Posters of videos are collected through the <video> element.
        if el.tag() == "img" && el.attr("src").map(is_video_thumbnail).unwrap_or(false) {
            continue;
        }

        let Some(mut item) = media_from_element(&el, items.len()) else {
            continue;
        };
        if items.iter().any(|existing| existing.url == item.url) {
            continue;
        }

        if let Some(info) = tweet {
            item = item.with_tweet(info);
            item.id = format!("{}_dom_{}", info.tweet_id, items.len());
        }

        if clicked_index.is_none() {
            if let Some(target) = clicked {
                if el.contains(target) || target.contains(&el) || wraps_same_media(target, &el) {
                    clicked_index = Some(items.len());
                }
            }
        }

        items.push(item);
    }

    (items, clicked_index.unwrap_or(0))
}

fn media_from_element(el: &Element, position: usize) -> Option<MediaItem> {
    match el.tag() {
        "img" => {
            let src = el.attr("src")?;
            let url = normalize_image_url(src);
            let id = media_key(&url).unwrap_or_else(|| format!("dom_{}", position));
            Some(MediaItem::new(id, url, MediaType::Image))
        }
        "video" => {
            let poster = el.attr("poster").map(str::to_string);

            if let Some(gif) = poster.as_deref().and_then(gif_url_from_thumbnail) {
                let id = media_key(&gif).unwrap_or_else(|| format!("dom_{}", position));
                return Some(MediaItem::new(id, gif, MediaType::Gif).with_thumbnail(poster));
            }

            let src = video_source(el)?;
            let id = media_key(&src).unwrap_or_else(|| format!("dom_{}", position));
            Some(MediaItem::new(id, src, MediaType::Video).with_thumbnail(poster))
        }
        _ => None,
    }
}

/// The clicked element shares the media wrapper of `media`.
fn wraps_same_media(clicked: &Element, media: &Element) -> bool {
    clicked
        .closest(is_media_wrapper)
        .map(|wrapper| wrapper.contains(media))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionMode;
    use crate::dom::DomTree;

    const TWEET: &str = r#"
        <html><body>
          <article data-testid="tweet">
            <a href="/alice/status/42"><time>now</time></a>
            <div data-testid="tweetPhoto"><img src="https://pbs.twimg.com/media/A?format=jpg&name=small"></div>
            <div data-testid="tweetPhoto"><img id="b" src="https://pbs.twimg.com/media/B.png"></div>
            <div data-testid="tweetPhoto"><div id="overlay"></div><img src="https://pbs.twimg.com/media/C.jpg"></div>
            <div data-testid="videoPlayer">
              <video poster="https://pbs.twimg.com/tweet_video_thumb/G.jpg" src="https://video.twimg.com/tweet_video/G.mp4"></video>
            </div>
            <img src="https://pbs.twimg.com/profile_images/1/avatar.jpg">
          </article>
          <div id="outside"></div>
        </body></html>
    "#;

    fn clicked(css: &str) -> ExtractionContext {
        let (_, matches) = DomTree::parse_and_select(TWEET, css).unwrap();
        ExtractionContext::new(matches[0].clone(), ExtractionMode::AllFromPost)
            .with_tweet_info(TweetInfo::new("42", Some("alice".into())))
    }

    #[tokio::test]
    async fn test_scans_all_media_in_order() {
        let ctx = clicked("#b");
        let strategy = DomScanStrategy::new();

        assert!(strategy.can_handle(&ctx));
        let result = strategy.extract(&ctx).await.unwrap();

        assert!(result.success);
        let urls: Vec<&str> = result.media_items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://pbs.twimg.com/media/A?format=jpg&name=orig",
                "https://pbs.twimg.com/media/B?format=png&name=orig",
                "https://pbs.twimg.com/media/C?format=jpg&name=orig",
                "https://video.twimg.com/tweet_video/G.mp4",
            ]
        );
        assert_eq!(result.media_items[3].media_type, MediaType::Gif);
        assert_eq!(result.media_items[0].id, "42_dom_0");
        assert_eq!(result.clicked_index, 1);
    }

    #[tokio::test]
    async fn test_overlay_click_maps_to_its_photo() {
        let result = DomScanStrategy::new()
            .extract(&clicked("#overlay"))
            .await
            .unwrap();
        assert_eq!(result.clicked_index, 2);
    }

    #[tokio::test]
    async fn test_outside_tweet_is_declined() {
        let ctx = clicked("#outside");
        assert!(!DomScanStrategy::new().can_handle(&ctx));

        let result = DomScanStrategy::new().extract(&ctx).await.unwrap();
        assert!(!result.success);
    }
}
