//! Resolving the command line source into a DOM element to extract from.

use std::path::Path;

use crate::config::{parse_status_path, parse_tweet_id};
use crate::dom::selectors::is_tweet_container;
use crate::dom::{DomTree, Element};
use crate::error::{Error, Result};

/// What to hand to the extraction service.
#[derive(Debug, Clone)]
pub enum Target {
    /// An element the user clicked.
    Clicked(Element),
    /// A whole tweet container, nothing clicked.
    Container(Element),
}

impl Target {
    pub fn element(&self) -> &Element {
        match self {
            Target::Clicked(el) | Target::Container(el) => el,
        }
    }
}

/// Load a saved page and pick the clicked element, or the first tweet when
/// no selector is given.
pub fn load_page(path: &Path, click: Option<&str>) -> Result<Target> {
    let html = std::fs::read_to_string(path)?;
    target_from_html(&html, click)
}

pub fn target_from_html(html: &str, click: Option<&str>) -> Result<Target> {
    if let Some(selector) = click {
        let (_tree, matches) = DomTree::parse_and_select(html, selector)?;
        return matches
            .into_iter()
            .next()
            .map(Target::Clicked)
            .ok_or_else(|| Error::Dom(format!("Selector matched nothing: {}", selector)));
    }

    let tree = DomTree::parse(html);
    tree.find_all(is_tweet_container)
        .into_iter()
        .next()
        .map(Target::Container)
        .ok_or_else(|| Error::Dom("No tweet found in page".to_string()))
}

/// Build a one-tweet page for a status URL or id, so the API strategy can
/// resolve it like a click on a timeline.
pub fn tweet_target(reference: &str) -> Result<Target> {
    let tweet_id = parse_tweet_id(reference)?;
    let username = url::Url::parse(reference.trim())
        .ok()
        .and_then(|url| parse_status_path(url.path()))
        .and_then(|(username, _)| username);

    let href = format!("/{}/status/{}", username.as_deref().unwrap_or("i"), tweet_id);
    let html = format!(
        r#"<html><body><article data-testid="tweet"><a href="{}"><time></time></a></article></body></html>"#,
        href
    );

    target_from_html(&html, None)
}
