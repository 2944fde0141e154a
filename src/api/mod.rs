//! Tweet API module.
//!
//! This module provides:
//! - HTTP client for the tweet detail GraphQL endpoint
//! - Guest and session authorization
//! - API response types

pub mod client;
pub mod types;

pub use client::{ApiCredentials, TweetMediaSource, TwitterApi, TWEET_RESULT_BY_REST_ID_QUERY_ID};
pub use types::*;
