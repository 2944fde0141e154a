//! Resolving the tweet a clicked element belongs to.

use async_trait::async_trait;

use crate::config::parse_status_path;
use crate::dom::selectors::{find_tweet_container, is_status_link};
use crate::dom::Element;
use crate::error::{Error, Result};
use crate::media::TweetInfo;

/// Determines tweet identity from a clicked element.
#[async_trait]
pub trait TweetInfoExtractor: Send + Sync {
    async fn extract(&self, element: &Element) -> Result<TweetInfo>;
}

/// Reads permalinks from the surrounding markup.
///
/// Lookup order: a status link enclosing the click (photo viewer, quoted
/// tweets), the container's timestamp permalink, any status link in the
/// container, then the document's canonical link.
#[derive(Debug, Default)]
pub struct DomTweetInfoExtractor;

impl DomTweetInfoExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, element: &Element) -> Option<TweetInfo> {
        if let Some(info) = element
            .closest(is_status_link)
            .and_then(|link| info_from_href(link.attr("href")?))
        {
            return Some(info);
        }

        if let Some(container) = find_tweet_container(element) {
            let links = container.find_all(is_status_link);

            let permalink = links
                .iter()
                .find(|link| link.find_first(|el| el.tag() == "time").is_some())
                .and_then(|link| info_from_href(link.attr("href")?));
            if permalink.is_some() {
                return permalink;
            }

            if let Some(info) = links
                .iter()
                .find_map(|link| info_from_href(link.attr("href")?))
            {
                return Some(info);
            }
        }

        element
            .tree()
            .find_all(|el| el.tag() == "link" && el.attr("rel") == Some("canonical"))
            .iter()
            .find_map(|link| info_from_href(link.attr("href")?))
    }
}

#[async_trait]
impl TweetInfoExtractor for DomTweetInfoExtractor {
    async fn extract(&self, element: &Element) -> Result<TweetInfo> {
        self.resolve(element)
            .ok_or_else(|| Error::TweetInfo(format!("no status link near {:?}", element)))
    }
}

fn info_from_href(href: &str) -> Option<TweetInfo> {
    let path = match url::Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => href.to_string(),
    };

    let (username, tweet_id) = parse_status_path(&path)?;
    Some(TweetInfo::new(tweet_id, username))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomTree;

    fn select(html: &str, css: &str) -> Element {
        let (_, matches) = DomTree::parse_and_select(html, css).unwrap();
        matches[0].clone()
    }

    #[tokio::test]
    async fn test_timestamp_permalink_wins() {
        let html = r#"
            <article data-testid="tweet">
              <a href="/bob/status/7">reply context</a>
              <a href="/alice/status/42"><time datetime="2024-01-01">Jan 1</time></a>
              <img id="pic" src="https://pbs.twimg.com/media/A.jpg">
            </article>"#;

        let info = DomTweetInfoExtractor::new()
            .extract(&select(html, "#pic"))
            .await
            .unwrap();
        assert_eq!(info.tweet_id, "42");
        assert_eq!(info.username.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_enclosing_photo_link_is_preferred() {
        let html = r#"
            <article data-testid="tweet">
              <a href="/alice/status/42"><time>now</time></a>
              <a href="https://x.com/carol/status/99/photo/1"><img id="quoted" src="https://pbs.twimg.com/media/Q.jpg"></a>
            </article>"#;

        let info = DomTweetInfoExtractor::new()
            .extract(&select(html, "#quoted"))
            .await
            .unwrap();
        assert_eq!(info.tweet_id, "99");
        assert_eq!(info.username.as_deref(), Some("carol"));
    }

    #[tokio::test]
    async fn test_canonical_link_fallback() {
        let html = r#"
            <html><head><link rel="canonical" href="https://x.com/dave/status/5"></head>
            <body><img id="lonely" src="https://pbs.twimg.com/media/L.jpg"></body></html>"#;

        let info = DomTweetInfoExtractor::new()
            .extract(&select(html, "#lonely"))
            .await
            .unwrap();
        assert_eq!(info.tweet_id, "5");
    }

    #[tokio::test]
    async fn test_missing_link_is_error() {
        let html = r#"<div><img id="x" src="https://pbs.twimg.com/media/A.jpg"></div>"#;
        let err = DomTweetInfoExtractor::new()
            .extract(&select(html, "#x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TweetInfo(_)));
    }
}
