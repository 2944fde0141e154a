//! Predicates for the X.com timeline markup.

use crate::dom::tree::Element;
use crate::media::url::{is_image_media_url, is_video_media_url};

/// `data-testid` of a rendered tweet.
pub const TWEET_TEST_ID: &str = "tweet";

/// `data-testid` wrapping each photo of a tweet.
pub const PHOTO_TEST_ID: &str = "tweetPhoto";

/// `data-testid` values wrapping a video player.
pub const VIDEO_TEST_IDS: &[&str] = &["videoPlayer", "videoComponent"];

/// Whether the element is the outer container of a tweet.
pub fn is_tweet_container(el: &Element) -> bool {
    el.test_id() == Some(TWEET_TEST_ID) || el.tag() == "article"
}

/// Whether the element wraps a photo or video of a tweet.
pub fn is_media_wrapper(el: &Element) -> bool {
    matches!(el.test_id(), Some(id) if id == PHOTO_TEST_ID || VIDEO_TEST_IDS.contains(&id))
}

/// `<img>` pointing at the media CDN.
pub fn is_media_image(el: &Element) -> bool {
    el.tag() == "img" && el.attr("src").map(is_image_media_url).unwrap_or(false)
}

/// `<video>` with a poster or a direct source on the media CDNs.
pub fn is_media_video(el: &Element) -> bool {
    if el.tag() != "video" {
        return false;
    }

    let direct = video_source(el)
        .map(|src| is_video_media_url(&src))
        .unwrap_or(false);
    let poster = el.attr("poster").map(is_image_media_url).unwrap_or(false);
    direct || poster
}

/// Direct `src` of a video, or of its first `<source>` child.
///
/// Streaming players expose `blob:` URLs, which never count.
pub fn video_source(el: &Element) -> Option<String> {
    let usable = |src: &str| !src.is_empty() && !src.starts_with("blob:");

    if let Some(src) = el.attr("src").filter(|s| usable(s)) {
        return Some(src.to_string());
    }

    el.children()
        .iter()
        .filter(|child| child.tag() == "source")
        .find_map(|child| child.attr("src").filter(|s| usable(s)).map(str::to_string))
}

/// Nearest tweet container enclosing the element.
pub fn find_tweet_container(el: &Element) -> Option<Element> {
    el.closest(is_tweet_container)
}

/// Link whose `href` is a tweet permalink.
pub fn is_status_link(el: &Element) -> bool {
    el.tag() == "a" && el.attr("href").map(|h| h.contains("/status/")).unwrap_or(false)
}
