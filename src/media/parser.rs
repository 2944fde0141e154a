//! Media parsing utilities.

use crate::api::types::{ApiMedia, TweetMedia, VideoInfo};
use crate::media::item::{MediaItem, MediaType, TweetInfo};
use crate::media::url::{dimensions_from_url, media_key, normalize_image_url};

/// Convert every attachment of a tweet into media items, in tweet order.
///
/// Attachments without a downloadable URL (e.g. videos with no MP4 variant)
/// are skipped.
pub fn parse_tweet_media(tweet: &TweetMedia) -> Vec<MediaItem> {
    let info = TweetInfo::new(tweet.tweet_id.clone(), tweet.screen_name.clone());

    tweet
        .media
        .iter()
        .filter_map(|media| parse_media_info(media, &info))
        .collect()
}

/// Parse one attachment, selecting the best quality URL.
pub fn parse_media_info(media: &ApiMedia, tweet: &TweetInfo) -> Option<MediaItem> {
    let media_type = MediaType::from_api_type(&media.kind)?;

    let (url, thumbnail) = match media_type {
        MediaType::Image => (normalize_image_url(&media.media_url_https), None),
        MediaType::Video | MediaType::Gif => {
            let url = select_best_variant(media.video_info.as_ref()?)?;
            (url, Some(media.media_url_https.clone()))
        }
    };

    let from_url = dimensions_from_url(&url);
    let width = media
        .original_info
        .as_ref()
        .and_then(|i| i.width)
        .or(from_url.map(|(w, _)| w));
    let height = media
        .original_info
        .as_ref()
        .and_then(|i| i.height)
        .or(from_url.map(|(_, h)| h));

    Some(
        MediaItem::new(media.id_str.clone(), url, media_type)
            .with_tweet(tweet)
            .with_dimensions(width, height)
            .with_thumbnail(thumbnail),
    )
}

/// Highest-bitrate MP4 variant. HLS playlists are never chosen.
fn select_best_variant(info: &VideoInfo) -> Option<String> {
    info.variants
        .iter()
        .filter(|v| v.content_type == "video/mp4")
        .max_by_key(|v| v.bitrate.unwrap_or(0))
        .map(|v| v.url.clone())
}

/// Index of the item matching a clicked media URL, compared by media key.
///
/// Video thumbnails are matched against each item's thumbnail.
pub fn find_clicked_index(items: &[MediaItem], clicked_url: &str) -> Option<usize> {
    let key = media_key(clicked_url)?;

    items.iter().position(|item| {
        media_key(&item.url).as_deref() == Some(key.as_str())
            || item
                .thumbnail_url
                .as_deref()
                .and_then(media_key)
                .as_deref()
                == Some(key.as_str())
    })
}
