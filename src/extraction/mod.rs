//! Media extraction module.
//!
//! Provides:
//! - The strategy trait and a chain that runs strategies with fallback,
//!   parallel groups and retries
//! - API and DOM scan strategies
//! - Tweet identity resolution
//! - A caching extraction service

pub mod chain;
pub mod service;
pub mod strategies;
pub mod strategy;
pub mod tweet_info;
pub mod types;

pub use chain::{Backoff, ChainOutcome, StrategyChain, StrategyChainBuilder, StrategyChainMetrics};
pub use service::{ExtractionOptions, MediaExtractionService};
pub use strategies::{ApiStrategy, DomScanStrategy};
pub use strategy::{with_retry, ChainEntry, ExtractionStrategy};
pub use tweet_info::{DomTweetInfoExtractor, TweetInfoExtractor};
pub use types::{
    ExtractionContext, ExtractionError, ExtractionErrorKind, ExtractionMetadata, ExtractionResult,
    SourceType,
};
