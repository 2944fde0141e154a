//! URL helpers for the X.com media CDNs.

use url::Url;

/// Host serving photos and video thumbnails.
pub const IMAGE_HOST: &str = "pbs.twimg.com";

/// Host serving video and GIF files.
pub const VIDEO_HOST: &str = "video.twimg.com";

const THUMBNAIL_MARKERS: &[&str] = &[
    "ext_tw_video_thumb",
    "amplify_video_thumb",
    "tweet_video_thumb",
];

fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_string)
}

/// Photo or video thumbnail on the image CDN (avatars and emoji excluded).
pub fn is_image_media_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    parsed.host_str() == Some(IMAGE_HOST)
        && (parsed.path().starts_with("/media/") || is_video_thumbnail(url))
}

pub fn is_video_media_url(url: &str) -> bool {
    host_of(url).as_deref() == Some(VIDEO_HOST)
}

pub fn is_video_thumbnail(url: &str) -> bool {
    THUMBNAIL_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Rewrite a photo URL so it requests the original resolution.
///
/// `.../media/ABC.jpg` and `.../media/ABC?format=jpg&name=small` both become
/// `.../media/ABC?format=jpg&name=orig`. Anything else is returned unchanged.
pub fn normalize_image_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if parsed.host_str() != Some(IMAGE_HOST) || !parsed.path().starts_with("/media/") {
        return url.to_string();
    }

    let mut format = parsed
        .query_pairs()
        .find(|(k, _)| k == "format")
        .map(|(_, v)| v.into_owned());

    let path = parsed.path().to_string();
    if let Some((stem, ext)) = path.rsplit_once('.') {
        if format.is_none() {
            format = Some(ext.to_lowercase());
        }
        parsed.set_path(stem);
    }

    let format = format.unwrap_or_else(|| "jpg".to_string());
    parsed
        .query_pairs_mut()
        .clear()
        .append_pair("format", &format)
        .append_pair("name", "orig");

    parsed.to_string()
}

/// File extension from a `format=` query or the last path segment.
pub fn extension_from_url(url: &str) -> Option<String> {
    if let Ok(parsed) = Url::parse(url) {
        if let Some((_, format)) = parsed.query_pairs().find(|(k, _)| k == "format") {
            if is_extension_like(&format) {
                return Some(format.to_lowercase());
            }
        }
        return extension_from_path(parsed.path());
    }

    extension_from_path(url.split('?').next()?)
}

fn extension_from_path(path: &str) -> Option<String> {
    let filename = path.rsplit('/').next()?;
    let (_, ext) = filename.rsplit_once('.')?;

    if is_extension_like(ext) {
        Some(ext.to_lowercase())
    } else {
        None
    }
}

fn is_extension_like(ext: &str) -> bool {
    !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Convert MIME type to file extension.
pub fn mime_to_extension(mimetype: &str) -> String {
    let base = mimetype.split(';').next().unwrap_or("").trim();
    match base {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        _ => "bin",
    }
    .to_string()
}

/// Stable key identifying a media asset regardless of size or format
/// parameters: the last path segment without its extension.
pub fn media_key(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next()?.to_string(),
    };

    let segment = path.rsplit('/').find(|s| !s.is_empty())?;
    let stem = segment.split('.').next().unwrap_or(segment);
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Direct MP4 for an animated GIF, derived from its poster image.
pub fn gif_url_from_thumbnail(poster: &str) -> Option<String> {
    if !poster.contains("tweet_video_thumb") {
        return None;
    }
    media_key(poster).map(|key| format!("https://{}/tweet_video/{}.mp4", VIDEO_HOST, key))
}

/// `WxH` dimensions embedded in a video variant path (`/vid/avc1/720x1280/...`).
pub fn dimensions_from_url(url: &str) -> Option<(u32, u32)> {
    let path = Url::parse(url).ok()?.path().to_string();
    path.split('/').find_map(|segment| {
        let (w, h) = segment.split_once('x')?;
        Some((w.parse().ok()?, h.parse().ok()?))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_from_url() {
        assert_eq!(
            extension_from_url("https://pbs.twimg.com/media/A.jpg"),
            Some("jpg".to_string())
        );
        assert_eq!(
            extension_from_url("https://pbs.twimg.com/media/A?format=webp&name=small"),
            Some("webp".to_string())
        );
        assert_eq!(
            extension_from_url("https://video.twimg.com/v/720x1280/B.MP4?tag=12"),
            Some("mp4".to_string())
        );
        assert_eq!(extension_from_url("https://video.twimg.com/tweet_video/X"), None);
    }

    #[test]
    fn test_mime_to_extension() {
        assert_eq!(mime_to_extension("image/jpeg"), "jpg");
        assert_eq!(mime_to_extension("video/mp4; codecs=avc1"), "mp4");
        assert_eq!(mime_to_extension("unknown/type"), "bin");
    }

    #[test]
    fn test_normalize_image_url() {
        assert_eq!(
            normalize_image_url("https://pbs.twimg.com/media/ABC.jpg"),
            "https://pbs.twimg.com/media/ABC?format=jpg&name=orig"
        );
        assert_eq!(
            normalize_image_url("https://pbs.twimg.com/media/ABC?format=png&name=small"),
            "https://pbs.twimg.com/media/ABC?format=png&name=orig"
        );
        let thumb = "https://pbs.twimg.com/ext_tw_video_thumb/1/pu/img/T.jpg";
        assert_eq!(normalize_image_url(thumb), thumb);
    }

    #[test]
    fn test_media_key_ignores_size_params() {
        assert_eq!(
            media_key("https://pbs.twimg.com/media/ABC?format=jpg&name=small"),
            media_key("https://pbs.twimg.com/media/ABC.jpg")
        );
        assert_eq!(
            media_key("https://video.twimg.com/ext_tw_video/1/pu/vid/avc1/720x1280/KEY.mp4?tag=12"),
            Some("KEY".to_string())
        );
    }

    #[test]
    fn test_media_host_checks() {
        assert!(is_image_media_url("https://pbs.twimg.com/media/A.jpg"));
        assert!(is_image_media_url(
            "https://pbs.twimg.com/tweet_video_thumb/G.jpg"
        ));
        assert!(!is_image_media_url(
            "https://pbs.twimg.com/profile_images/1/me.jpg"
        ));
        assert!(is_video_media_url("https://video.twimg.com/a.mp4"));
        assert!(!is_video_media_url("blob:https://x.com/1"));
    }

    #[test]
    fn test_gif_and_dimensions() {
        assert_eq!(
            gif_url_from_thumbnail("https://pbs.twimg.com/tweet_video_thumb/GKEY.jpg"),
            Some("https://video.twimg.com/tweet_video/GKEY.mp4".to_string())
        );
        assert_eq!(
            gif_url_from_thumbnail("https://pbs.twimg.com/ext_tw_video_thumb/1/pu/img/T.jpg"),
            None
        );
        assert_eq!(
            dimensions_from_url("https://video.twimg.com/ext_tw_video/1/pu/vid/avc1/720x1280/K.mp4"),
            Some((720, 1280))
        );
    }
}
