//! Download module.
//!
//! This module provides:
//! - Host capability detection
//! - Single resource delivery (native hook, fetch + object URL, anchor)
//! - In-memory ZIP packaging
//! - Bulk orchestration with partial-failure aggregation
//! - A reqwest/filesystem host for the command line

pub mod archive;
pub mod capability;
pub mod host;
pub mod local;
pub mod orchestrator;
pub mod result;
pub mod single;

pub use archive::{ZipEntry, ZipPackager};
pub use capability::{detect_capabilities, Capabilities, DownloadMethod};
pub use host::{
    AnchorDownloader, BlobStore, BlobUrlGuard, FetchResponse, Fetcher, HookOutcome,
    HostEnvironment, NativeDownloadHook,
};
pub use local::{LocalHost, MemoryBlobStore};
pub use orchestrator::{BulkOptions, DownloadOrchestrator, OrchestratorSettings};
pub use result::{DownloadFailure, DownloadResult, DownloadStatus};
pub use single::SingleDownloadExecutor;
