//! Configuration module for xcom-gallery.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Extraction mode definitions
//! - Configuration validation and tweet reference parsing

pub mod loader;
pub mod modes;
pub mod validation;

pub use loader::{AccountConfig, Config, OptionsConfig};
pub use modes::ExtractionMode;
pub use validation::{parse_status_path, parse_tweet_id, validate_config};
