//! xcom-gallery - media extraction and bulk download for X.com posts.
//!
//! Given a clicked element of a timeline snapshot, the extraction service
//! resolves the tweet, runs a chain of strategies (tweet API first, then a
//! scan of the tweet's markup) and returns the ordered media of the post.
//! The download orchestrator then delivers those items one by one or as a
//! single ZIP archive, reporting partial failures instead of aborting.
//!
//! # Features
//!
//! - Strategy chain with sequential fallback, parallel groups and retries
//! - Per-tweet result cache
//! - Native save hook, fetch + object URL, or plain link delivery
//! - In-memory ZIP packaging with bounded concurrent fetches
//! - Progress events over a broadcast bus
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use xcom_gallery::{
//!     cli::load_page, BulkOptions, Config, ExtractionOptions, Services,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!     let mode = config.options.extraction_mode;
//!     let services = Services::builder(config).build()?;
//!
//!     let target = load_page(Path::new("timeline.html"), Some("img[alt=Image]"))?;
//!     let result = services
//!         .extraction
//!         .extract_from_clicked_element(target.element(), ExtractionOptions::new(mode))
//!         .await;
//!
//!     let download = services
//!         .downloads
//!         .download_bulk(&result.media_items, BulkOptions::default())
//!         .await?;
//!     println!("{} of {} saved", download.files_successful, download.files_processed);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod dom;
pub mod download;
pub mod error;
pub mod events;
pub mod extraction;
pub mod fs;
pub mod media;
pub mod output;
pub mod services;

// Re-exports for convenience
pub use api::TwitterApi;
pub use config::{Config, ExtractionMode};
pub use download::{
    BulkOptions, DownloadOrchestrator, DownloadResult, DownloadStatus, HostEnvironment, LocalHost,
};
pub use error::{Error, Result};
pub use events::{EventBus, GalleryEvent};
pub use extraction::{
    ExtractionOptions, ExtractionResult, ExtractionStrategy, MediaExtractionService, StrategyChain,
};
pub use media::{MediaItem, MediaType, TweetInfo};
pub use services::{Services, ServicesBuilder};
