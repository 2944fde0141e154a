//! Progress bar utilities.

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::events::{DownloadPhase, EventBus, GalleryEvent};

/// Create a spinner for long-running operations.
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

/// Create a progress bar for byte streams.
pub fn create_download_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
    {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar
}

/// Create a progress bar for item counts.
pub fn create_item_bar(total: u64, message: &str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(&format!(
        "{{spinner:.green}} {} [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {{msg}}",
        message
    )) {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar
}

/// Drive an item bar from download progress events until a download finishes.
pub fn spawn_progress_listener(events: &EventBus) -> JoinHandle<()> {
    let mut rx = events.subscribe();

    tokio::spawn(async move {
        let mut bar: Option<ProgressBar> = None;

        loop {
            match rx.recv().await {
                Ok(GalleryEvent::DownloadProgress {
                    phase,
                    current,
                    total,
                    filename,
                }) => {
                    let pb = bar.get_or_insert_with(|| create_item_bar(total as u64, "Downloading"));
                    pb.set_length(total as u64);
                    pb.set_position(current as u64);
                    match phase {
                        DownloadPhase::Zipping => pb.set_message("packaging archive"),
                        DownloadPhase::Complete => pb.set_message(""),
                        _ => pb.set_message(filename.unwrap_or_default()),
                    }
                }
                Ok(GalleryEvent::ItemFailed { url, error }) => {
                    if let Some(ref pb) = bar {
                        pb.println(format!("failed: {} ({})", url, error));
                    }
                }
                Ok(GalleryEvent::DownloadFinished { .. }) => {
                    if let Some(pb) = bar.take() {
                        pb.finish_and_clear();
                    }
                    break;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Progress listener skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
