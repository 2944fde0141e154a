//! Extraction context, result and error types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::ExtractionMode;
use crate::dom::Element;
use crate::media::{MediaItem, TweetInfo};

/// Input handed to every strategy of a chain.
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    /// Element the user clicked.
    pub element: Element,
    pub mode: ExtractionMode,
    /// Correlates log lines and events of one extraction.
    pub correlation_id: String,
    pub tweet_info: Option<TweetInfo>,
}

impl ExtractionContext {
    pub fn new(element: Element, mode: ExtractionMode) -> Self {
        Self {
            element,
            mode,
            correlation_id: format!("xg_{}", uuid::Uuid::new_v4()),
            tweet_info: None,
        }
    }

    pub fn with_tweet_info(mut self, info: TweetInfo) -> Self {
        self.tweet_info = Some(info);
        self
    }

    pub fn tweet_id(&self) -> Option<&str> {
        self.tweet_info.as_ref().map(|i| i.tweet_id.as_str())
    }
}

/// Where a result came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    Api,
    DomScan,
    /// Every strategy of the chain was tried and none succeeded.
    ChainExhausted,
    /// Extraction stopped before any strategy ran.
    ExtractionFailed,
    Custom(String),
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Api => write!(f, "api"),
            SourceType::DomScan => write!(f, "dom-scan"),
            SourceType::ChainExhausted => write!(f, "strategy-chain-failed"),
            SourceType::ExtractionFailed => write!(f, "extraction-failed"),
            SourceType::Custom(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionErrorKind {
    /// The clicked element could not be tied to a tweet.
    NoTweetInfo,
    /// A strategy ran but found nothing.
    NoMediaFound,
    /// A strategy returned an error.
    StrategyFailed,
    /// No strategy was able to handle the context.
    NoStrategy,
}

/// A recorded extraction failure.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{message}")]
pub struct ExtractionError {
    pub kind: ExtractionErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

impl ExtractionError {
    pub fn new(kind: ExtractionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            strategy: None,
        }
    }

    pub fn from_strategy(strategy: &str, err: &crate::error::Error) -> Self {
        Self {
            kind: ExtractionErrorKind::StrategyFailed,
            message: format!("{}: {}", strategy, err),
            strategy: Some(strategy.to_string()),
        }
    }

    pub fn no_media(strategy: &str) -> Self {
        Self {
            kind: ExtractionErrorKind::NoMediaFound,
            message: format!("{}: no media found", strategy),
            strategy: Some(strategy.to_string()),
        }
    }
}

/// Bookkeeping attached to every result.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionMetadata {
    pub source_type: SourceType,
    /// Strategies attempted.
    pub attempts: u32,
    /// Retries performed across all strategies.
    pub retries: u32,
    pub cache_hit: bool,
    /// Strategy that produced the media.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    pub extracted_at: DateTime<Utc>,
}

impl ExtractionMetadata {
    pub fn new(source_type: SourceType) -> Self {
        Self {
            source_type,
            attempts: 0,
            retries: 0,
            cache_hit: false,
            strategy: None,
            extracted_at: Utc::now(),
        }
    }
}

/// Outcome of an extraction.
///
/// `success` holds exactly when there is at least one media item and no error.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub success: bool,
    pub media_items: Vec<MediaItem>,
    /// Position of the clicked item in `media_items`.
    pub clicked_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tweet_info: Option<TweetInfo>,
    pub metadata: ExtractionMetadata,
    pub errors: Vec<ExtractionError>,
}

impl ExtractionResult {
    /// Successful result; an empty item list is turned into a failure.
    pub fn succeeded(media_items: Vec<MediaItem>, clicked_index: usize, source_type: SourceType) -> Self {
        if media_items.is_empty() {
            let name = source_type.to_string();
            return Self::failed(source_type, vec![ExtractionError::no_media(&name)]);
        }

        let clicked_index = clicked_index.min(media_items.len() - 1);
        Self {
            success: true,
            media_items,
            clicked_index,
            tweet_info: None,
            metadata: ExtractionMetadata::new(source_type),
            errors: Vec::new(),
        }
    }

    pub fn failed(source_type: SourceType, errors: Vec<ExtractionError>) -> Self {
        Self {
            success: false,
            media_items: Vec::new(),
            clicked_index: 0,
            tweet_info: None,
            metadata: ExtractionMetadata::new(source_type),
            errors,
        }
    }

    pub fn with_tweet_info(mut self, info: Option<TweetInfo>) -> Self {
        self.tweet_info = info;
        self
    }

    /// Re-derive `success` after the item list or errors were edited.
    pub(crate) fn refresh_success(&mut self) {
        self.success = !self.media_items.is_empty() && self.errors.is_empty();
        if self.media_items.is_empty() {
            self.clicked_index = 0;
        } else {
            self.clicked_index = self.clicked_index.min(self.media_items.len() - 1);
        }
    }
}
