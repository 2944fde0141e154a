//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - Progress bars driven by pipeline events
//! - Extraction and download summaries

pub mod console;
pub mod progress;
pub mod stats;

pub use console::{
    print_banner, print_config_summary, print_error, print_info, print_success, print_warning,
};
pub use progress::{create_download_bar, create_item_bar, create_spinner, spawn_progress_listener};
pub use stats::{print_download_result, print_extraction_summary, print_media_list};
