//! Extraction and download summaries.

use console::style;

use crate::download::{DownloadResult, DownloadStatus};
use crate::extraction::{ExtractionResult, StrategyChainMetrics};
use crate::media::MediaItem;

/// Print what an extraction found and where it came from.
pub fn print_extraction_summary(result: &ExtractionResult, metrics: Option<&StrategyChainMetrics>) {
    println!();
    let title = match result.tweet_info {
        Some(ref info) => format!(
            "Media of {}/{}:",
            info.username.as_deref().unwrap_or("unknown"),
            info.tweet_id
        ),
        None => "Media:".to_string(),
    };
    println!("{}", style(title).bold());
    println!("  Items:    {}", result.media_items.len());
    println!("  Clicked:  #{}", result.clicked_index + 1);
    println!("  Source:   {}", result.metadata.source_type);
    println!(
        "  Attempts: {} ({} retries{})",
        result.metadata.attempts,
        result.metadata.retries,
        if result.metadata.cache_hit { ", cached" } else { "" }
    );

    if let Some(metrics) = metrics {
        if !metrics.failed_strategies.is_empty() {
            println!(
                "  Fell back after: {}",
                style(metrics.failed_strategies.join(", ")).yellow()
            );
        }
        println!("  Took:     {:?}", metrics.total_duration);
    }
}

/// One line per media item.
pub fn print_media_list(items: &[MediaItem], clicked_index: usize) {
    for (i, item) in items.iter().enumerate() {
        let marker = if i == clicked_index { ">" } else { " " };
        let dims = match (item.width, item.height) {
            (Some(w), Some(h)) => format!(" {}x{}", w, h),
            _ => String::new(),
        };
        println!(
            "{} {:>2}. {:<5}{} {}",
            marker,
            i + 1,
            format!("{:?}", item.media_type).to_lowercase(),
            dims,
            item.url
        );
    }
}

/// Print the outcome of a download.
pub fn print_download_result(result: &DownloadResult) {
    println!();
    println!("{}", style("─".repeat(50)).dim());

    let status = match result.status {
        DownloadStatus::Success => style("complete").green(),
        DownloadStatus::Partial => style("partial").yellow(),
        DownloadStatus::Error => style("failed").red(),
    };
    println!("{} {}", style("Download").bold(), status);
    println!(
        "  Files:    {}/{} downloaded",
        style(result.files_successful).green(),
        result.files_processed
    );
    if let Some(ref filename) = result.filename {
        println!("  Saved as: {}", filename);
    }
    if let Some(ref method) = result.method {
        println!("  Method:   {}", method);
    }

    for failure in &result.failures {
        println!("  {} {}: {}", style("x").red(), failure.url, failure.error);
    }
    println!("{}", style("─".repeat(50)).dim());
}
