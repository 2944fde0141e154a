//! In-process event bus for extraction and download progress.
//!
//! Producers call [`EventBus::emit`]; the CLI (or any embedder) subscribes
//! to drive progress bars and notifications.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Stage of a bulk download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadPhase {
    Preparing,
    Downloading,
    Zipping,
    Complete,
}

/// Pipeline events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GalleryEvent {
    ExtractionStarted {
        correlation_id: String,
        timestamp: DateTime<Utc>,
    },
    ExtractionCompleted {
        correlation_id: String,
        media_count: usize,
        source: String,
        cache_hit: bool,
        timestamp: DateTime<Utc>,
    },
    ExtractionFailed {
        correlation_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
    DownloadProgress {
        phase: DownloadPhase,
        current: usize,
        total: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
    ItemFailed {
        url: String,
        error: String,
    },
    DownloadFinished {
        status: String,
        files_processed: usize,
        files_successful: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast channel shared by every pipeline component.
///
/// Cloning is cheap; all clones publish to the same subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<GalleryEvent>,
}

impl EventBus {
    /// Create a new bus with default capacity (256 events).
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. No-op if nobody is listening.
    pub fn emit(&self, event: GalleryEvent) {
        // Ignore send errors (no active receivers)
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GalleryEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
