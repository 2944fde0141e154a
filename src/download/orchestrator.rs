//! Single and bulk download orchestration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::time::sleep;

use crate::config::Config;
use crate::download::archive::{ZipEntry, ZipPackager};
use crate::download::capability::{detect_capabilities, Capabilities, DownloadMethod};
use crate::download::host::HostEnvironment;
use crate::download::result::{DownloadFailure, DownloadResult};
use crate::download::single::SingleDownloadExecutor;
use crate::error::{Error, Result};
use crate::events::{DownloadPhase, EventBus, GalleryEvent};
use crate::fs::FilenameResolver;
use crate::media::MediaItem;

/// Tunables for [`DownloadOrchestrator`].
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub zip_enabled: bool,
    /// Bulk downloads with at most this many items skip the archive.
    pub single_threshold: usize,
    pub concurrency: usize,
    /// Extra attempts per item for transient fetch errors.
    pub item_retries: u32,
    pub retry_delay: Duration,
    pub hook_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            zip_enabled: true,
            single_threshold: 1,
            concurrency: 4,
            item_retries: 1,
            retry_delay: Duration::from_millis(200),
            hook_timeout: Duration::from_secs(30),
        }
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            zip_enabled: config.options.zip_enabled,
            single_threshold: config.options.single_threshold,
            concurrency: config.options.concurrency,
            item_retries: config.options.item_retries,
            retry_delay: config.backoff_base(),
            hook_timeout: config.native_hook_timeout(),
        }
    }
}

/// Per-call overrides for [`DownloadOrchestrator::download_bulk`].
#[derive(Debug, Clone, Default)]
pub struct BulkOptions {
    pub zip_filename: Option<String>,
    /// Overrides `zip_enabled` when set.
    pub zip: Option<bool>,
}

pub struct DownloadOrchestrator {
    host: Arc<dyn HostEnvironment>,
    executor: SingleDownloadExecutor,
    capabilities: Capabilities,
    resolver: Arc<dyn FilenameResolver>,
    packager: ZipPackager,
    events: EventBus,
    settings: OrchestratorSettings,
    cancelled: AtomicBool,
}

impl DownloadOrchestrator {
    /// Create an orchestrator, probing `host` once.
    pub fn new(
        host: Arc<dyn HostEnvironment>,
        resolver: Arc<dyn FilenameResolver>,
        events: EventBus,
        settings: OrchestratorSettings,
    ) -> Self {
        let capabilities = detect_capabilities(host.as_ref());
        let executor = SingleDownloadExecutor::new(host.clone(), settings.hook_timeout);

        Self {
            host,
            executor,
            capabilities,
            resolver,
            packager: ZipPackager::new(),
            events,
            settings,
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Probe the host again.
    pub fn redetect(&mut self) -> Capabilities {
        self.capabilities = detect_capabilities(self.host.as_ref());
        self.capabilities
    }

    /// Stop starting new items. Items already in flight finish.
    ///
    /// Sticky until [`resume`](Self::resume).
    pub fn cancel(&self) {
        tracing::info!("Download cancellation requested");
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn method(&self) -> Result<DownloadMethod> {
        self.capabilities.method.ok_or(Error::NoCapability)
    }

    /// Download one item under its resolved filename.
    pub async fn download_single(&self, item: &MediaItem) -> Result<DownloadResult> {
        let method = self.method()?;
        let filename = self.resolver.resolve(item, 0);
        self.progress(DownloadPhase::Preparing, 0, 1, Some(&filename));

        let mut failures = Vec::new();
        let outcome = if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            self.executor.download(method, &item.url, &filename).await
        };
        if let Err(e) = outcome {
            failures.push(self.failure(&item.url, &e));
        }

        let result = DownloadResult::aggregate(1, failures)
            .with_filename(filename)
            .with_method(method);
        self.finish(&result);
        Ok(result)
    }

    /// Download `items`, as one archive when enabled and worthwhile, otherwise one by one.
    pub async fn download_bulk(
        &self,
        items: &[MediaItem],
        options: BulkOptions,
    ) -> Result<DownloadResult> {
        if items.is_empty() {
            let result = DownloadResult::empty();
            self.finish(&result);
            return Ok(result);
        }

        let method = self.method()?;
        let zip = options.zip.unwrap_or(self.settings.zip_enabled);
        let above_threshold = items.len() > self.settings.single_threshold;

        let result = if zip && above_threshold && self.capabilities.can_package() {
            self.download_as_archive(items, method, options.zip_filename)
                .await
        } else {
            if zip && above_threshold {
                tracing::warn!("Host cannot package archives, downloading items individually");
            }
            self.download_each(items, method).await
        };

        let result = result.with_method(method);
        self.finish(&result);
        Ok(result)
    }

    async fn download_each(&self, items: &[MediaItem], method: DownloadMethod) -> DownloadResult {
        let total = items.len();
        tracing::info!("Downloading {} items individually via {}", total, method);

        let mut failures = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let filename = self.resolver.resolve(item, index);
            self.progress(DownloadPhase::Downloading, index + 1, total, Some(&filename));

            let outcome = if self.is_cancelled() {
                Err(Error::Cancelled)
            } else {
                self.executor.download(method, &item.url, &filename).await
            };
            if let Err(e) = outcome {
                failures.push(self.failure(&item.url, &e));
            }
        }

        DownloadResult::aggregate(total, failures)
    }

    async fn download_as_archive(
        &self,
        items: &[MediaItem],
        method: DownloadMethod,
        zip_filename: Option<String>,
    ) -> DownloadResult {
        let total = items.len();
        let zip_name = with_zip_extension(
            zip_filename.unwrap_or_else(|| self.resolver.resolve_zip(items)),
        );
        tracing::info!("Fetching {} items for {}", total, zip_name);
        self.progress(DownloadPhase::Preparing, 0, total, Some(&zip_name));

        let mut fetched = Vec::with_capacity(total);
        let mut fetches = stream::iter(items.iter().enumerate())
            .map(|(index, item)| async move { (index, self.fetch_with_retry(&item.url).await) })
            .buffer_unordered(self.settings.concurrency.max(1));

        while let Some(outcome) = fetches.next().await {
            fetched.push(outcome);
            self.progress(DownloadPhase::Downloading, fetched.len(), total, None);
        }
        fetched.sort_by_key(|(index, _)| *index);

        let mut entries = Vec::new();
        let mut fetched_urls = Vec::new();
        let mut failures = Vec::new();
        for (index, outcome) in fetched {
            let item = &items[index];
            match outcome {
                Ok(data) => {
                    entries.push(ZipEntry::new(self.resolver.resolve(item, index), data));
                    fetched_urls.push((index, item.url.as_str()));
                }
                Err(e) => failures.push((index, self.failure(&item.url, &e))),
            }
        }

        if entries.is_empty() {
            tracing::error!("Every item failed, not delivering {}", zip_name);
            return DownloadResult::aggregate(total, strip_index(failures)).with_filename(zip_name);
        }

        self.progress(DownloadPhase::Zipping, entries.len(), total, Some(&zip_name));
        let delivered = match self.packager.package(&entries) {
            Ok(archive) => self
                .executor
                .deliver_bytes(method, archive.clone(), "application/zip", &zip_name)
                .await
                .map(|_| archive),
            Err(e) => Err(e),
        };

        match delivered {
            Ok(archive) => {
                tracing::info!(
                    "Delivered {} ({} of {} files, {} bytes)",
                    zip_name,
                    entries.len(),
                    total,
                    archive.len()
                );
                DownloadResult::aggregate(total, strip_index(failures))
                    .with_filename(zip_name)
                    .with_zip_data(archive)
            }
            Err(e) => {
                tracing::error!("Failed to deliver {}: {}", zip_name, e);
                for (index, url) in fetched_urls {
                    failures.push((index, self.failure(url, &e)));
                }
                failures.sort_by_key(|(index, _)| *index);
                DownloadResult::aggregate(total, strip_index(failures)).with_filename(zip_name)
            }
        }
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            if self.is_cancelled() {
                return Err(Error::Cancelled);
            }

            match self.executor.fetch_bytes(url).await {
                Ok(data) => return Ok(data),
                Err(e) if e.is_transient() && attempt < self.settings.item_retries => {
                    attempt += 1;
                    let delay = self.settings.retry_delay * attempt;
                    tracing::warn!("Fetching {} failed ({}), retrying in {:?}", url, e, delay);
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn failure(&self, url: &str, err: &Error) -> DownloadFailure {
        tracing::warn!("Failed to download {}: {}", url, err);
        self.events.emit(GalleryEvent::ItemFailed {
            url: url.to_string(),
            error: err.to_string(),
        });
        DownloadFailure::from_error(url, err)
    }

    fn progress(&self, phase: DownloadPhase, current: usize, total: usize, filename: Option<&str>) {
        self.events.emit(GalleryEvent::DownloadProgress {
            phase,
            current,
            total,
            filename: filename.map(str::to_string),
        });
    }

    fn finish(&self, result: &DownloadResult) {
        self.progress(
            DownloadPhase::Complete,
            result.files_processed,
            result.files_processed,
            result.filename.as_deref(),
        );
        self.events.emit(GalleryEvent::DownloadFinished {
            status: result.status.to_string(),
            files_processed: result.files_processed,
            files_successful: result.files_successful,
            timestamp: Utc::now(),
        });
        tracing::info!(
            "Download finished: {} ({}/{} files)",
            result.status,
            result.files_successful,
            result.files_processed
        );
    }
}

fn with_zip_extension(name: String) -> String {
    if name.to_lowercase().ends_with(".zip") {
        name
    } else {
        format!("{}.zip", name)
    }
}

fn strip_index(failures: Vec<(usize, DownloadFailure)>) -> Vec<DownloadFailure> {
    failures.into_iter().map(|(_, f)| f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::host::{
        AnchorDownloader, BlobStore, FetchResponse, Fetcher, HookOutcome, NativeDownloadHook,
    };
    use crate::download::result::DownloadStatus;
    use crate::fs::TweetFilenameResolver;
    use crate::media::{MediaType, TweetInfo};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::io::{Cursor, Read};
    use std::sync::Mutex;

    #[derive(Default)]
    struct State {
        responses: HashMap<String, (u16, Vec<u8>)>,
        transient_failures: HashMap<String, u32>,
        fetch_calls: HashMap<String, u32>,
        blobs: HashMap<String, Vec<u8>>,
        next_blob: usize,
        delivered: Vec<(String, Vec<u8>)>,
        fail_delivery: bool,
    }

    #[derive(Clone, Default)]
    struct StubHost {
        state: Arc<Mutex<State>>,
        hook: Option<Arc<dyn NativeDownloadHook>>,
        no_fetch: bool,
        no_blob: bool,
    }

    impl StubHost {
        fn respond(self, url: &str, status: u16, body: &[u8]) -> Self {
            self.state
                .lock()
                .unwrap()
                .responses
                .insert(url.to_string(), (status, body.to_vec()));
            self
        }

        fn delivered(&self) -> Vec<(String, Vec<u8>)> {
            self.state.lock().unwrap().delivered.clone()
        }

        fn live_blobs(&self) -> usize {
            self.state.lock().unwrap().blobs.len()
        }
    }

    #[async_trait]
    impl Fetcher for StubHost {
        async fn fetch(&self, url: &str) -> Result<FetchResponse> {
            let mut state = self.state.lock().unwrap();
            *state.fetch_calls.entry(url.to_string()).or_default() += 1;
            if let Some(left) = state.transient_failures.get_mut(url) {
                if *left > 0 {
                    *left -= 1;
                    return Err(Error::Network("connection reset".into()));
                }
            }
            let (status, body) = state
                .responses
                .get(url)
                .cloned()
                .unwrap_or((404, b"missing".to_vec()));
            Ok(FetchResponse::new(status, body))
        }
    }

    impl BlobStore for StubHost {
        fn create_object_url(&self, data: Vec<u8>, _mime: &str) -> String {
            let mut state = self.state.lock().unwrap();
            state.next_blob += 1;
            let url = format!("blob:stub/{}", state.next_blob);
            state.blobs.insert(url.clone(), data);
            url
        }

        fn revoke_object_url(&self, url: &str) {
            self.state.lock().unwrap().blobs.remove(url);
        }
    }

    #[async_trait]
    impl AnchorDownloader for StubHost {
        async fn click(&self, href: &str, filename: &str) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if state.fail_delivery {
                return Err(Error::Download("save dialog dismissed".into()));
            }
            let data = state
                .blobs
                .get(href)
                .cloned()
                .or_else(|| state.responses.get(href).map(|(_, b)| b.clone()))
                .unwrap_or_default();
            state.delivered.push((filename.to_string(), data));
            Ok(())
        }
    }

    impl HostEnvironment for StubHost {
        fn native_download_hook(&self) -> Option<Arc<dyn NativeDownloadHook>> {
            self.hook.clone()
        }
        fn fetcher(&self) -> Option<Arc<dyn Fetcher>> {
            (!self.no_fetch).then(|| Arc::new(self.clone()) as Arc<dyn Fetcher>)
        }
        fn blob_store(&self) -> Option<Arc<dyn BlobStore>> {
            (!self.no_blob).then(|| Arc::new(self.clone()) as Arc<dyn BlobStore>)
        }
        fn anchor(&self) -> Arc<dyn AnchorDownloader> {
            Arc::new(self.clone())
        }
    }

    struct NeverHook;

    #[async_trait]
    impl NativeDownloadHook for NeverHook {
        async fn save(&self, _url: &str, _filename: &str) -> HookOutcome {
            std::future::pending().await
        }
    }

    fn orchestrator(host: &StubHost, settings: OrchestratorSettings) -> DownloadOrchestrator {
        DownloadOrchestrator::new(
            Arc::new(host.clone()),
            Arc::new(TweetFilenameResolver::default()),
            EventBus::new(),
            settings,
        )
    }

    fn image(url: &str) -> MediaItem {
        let tweet = TweetInfo::new("100", Some("alice".into()));
        MediaItem::new(url, url, MediaType::Image).with_tweet(&tweet)
    }

    fn zip_names(data: &[u8]) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data.to_vec())).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut body = Vec::new();
                file.read_to_end(&mut body).unwrap();
                file.name().to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_bulk_partial_without_zip() {
        let host = StubHost::default()
            .respond("https://pbs.twimg.com/media/ok.jpg", 200, b"ok")
            .respond("https://pbs.twimg.com/media/bad.jpg", 404, b"<html>gone</html>");
        let orch = orchestrator(&host, OrchestratorSettings::default());

        let result = orch
            .download_bulk(
                &[
                    image("https://pbs.twimg.com/media/ok.jpg"),
                    image("https://pbs.twimg.com/media/bad.jpg"),
                ],
                BulkOptions {
                    zip: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.status, DownloadStatus::Partial);
        assert_eq!(result.files_successful, 1);
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].error.to_lowercase().contains("http"));
        assert_eq!(host.delivered().len(), 1);
        assert_eq!(host.delivered()[0].0, "alice_100_1.jpg");
        assert_eq!(host.live_blobs(), 0);
    }

    #[tokio::test]
    async fn test_zip_contains_only_successes() {
        let host = StubHost::default()
            .respond("https://x/1.jpg", 200, b"one")
            .respond("https://x/2.jpg", 200, b"two")
            .respond("https://x/3.jpg", 200, b"three")
            .respond("https://x/4.jpg", 404, b"nope");
        let orch = orchestrator(&host, OrchestratorSettings::default());
        let items: Vec<_> = (1..=4).map(|i| image(&format!("https://x/{}.jpg", i))).collect();

        let result = orch.download_bulk(&items, BulkOptions::default()).await.unwrap();

        assert_eq!(result.files_processed, 4);
        assert_eq!(result.files_successful, 3);
        assert_eq!(result.status, DownloadStatus::Partial);
        assert_eq!(result.filename.as_deref(), Some("alice_100.zip"));

        let zip_data = result.zip_data.unwrap();
        assert_eq!(
            zip_names(&zip_data),
            vec!["alice_100_1.jpg", "alice_100_2.jpg", "alice_100_3.jpg"]
        );

        let delivered = host.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, "alice_100.zip");
        assert_eq!(delivered[0].1, zip_data);
        assert_eq!(host.live_blobs(), 0);
    }

    #[tokio::test]
    async fn test_zip_all_failed_delivers_nothing() {
        let host = StubHost::default();
        let orch = orchestrator(&host, OrchestratorSettings::default());
        let items = [image("https://x/a.jpg"), image("https://x/b.jpg")];

        let result = orch.download_bulk(&items, BulkOptions::default()).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.status, DownloadStatus::Error);
        assert_eq!(result.failures.len(), 2);
        assert!(result.zip_data.is_none());
        assert!(host.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_zip_delivery_failure_fails_every_item() {
        let host = StubHost::default()
            .respond("https://x/a.jpg", 200, b"a")
            .respond("https://x/b.jpg", 200, b"b");
        host.state.lock().unwrap().fail_delivery = true;
        let orch = orchestrator(&host, OrchestratorSettings::default());

        let result = orch
            .download_bulk(
                &[image("https://x/a.jpg"), image("https://x/b.jpg")],
                BulkOptions {
                    zip_filename: Some("custom".into()),
                    zip: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(result.status, DownloadStatus::Error);
        assert_eq!(result.files_successful, 0);
        assert_eq!(result.failures[0].url, "https://x/a.jpg");
        assert_eq!(result.filename.as_deref(), Some("custom.zip"));
        assert_eq!(host.live_blobs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_fetch_is_retried() {
        let host = StubHost::default()
            .respond("https://x/a.jpg", 200, b"a")
            .respond("https://x/b.jpg", 200, b"b");
        host.state
            .lock()
            .unwrap()
            .transient_failures
            .insert("https://x/a.jpg".into(), 1);
        let orch = orchestrator(&host, OrchestratorSettings::default());

        let result = orch
            .download_bulk(
                &[image("https://x/a.jpg"), image("https://x/b.jpg")],
                BulkOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(result.status, DownloadStatus::Success);
        assert_eq!(host.state.lock().unwrap().fetch_calls["https://x/a.jpg"], 2);
    }

    #[tokio::test]
    async fn test_http_errors_are_not_retried() {
        let host = StubHost::default()
            .respond("https://x/a.jpg", 200, b"a")
            .respond("https://x/b.jpg", 403, b"denied");
        let orch = orchestrator(&host, OrchestratorSettings::default());

        orch.download_bulk(
            &[image("https://x/a.jpg"), image("https://x/b.jpg")],
            BulkOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(host.state.lock().unwrap().fetch_calls["https://x/b.jpg"], 1);
    }

    #[tokio::test]
    async fn test_empty_bulk() {
        let orch = orchestrator(&StubHost::default(), OrchestratorSettings::default());
        let result = orch.download_bulk(&[], BulkOptions::default()).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.status, DownloadStatus::Error);
        assert_eq!(result.error.as_deref(), Some("No files to download"));
    }

    #[tokio::test]
    async fn test_no_capability_is_an_error() {
        let host = StubHost {
            no_fetch: true,
            no_blob: true,
            ..Default::default()
        };
        let orch = orchestrator(&host, OrchestratorSettings::default());
        assert!(orch.capabilities().method.is_none());

        let err = orch
            .download_single(&image("https://x/a.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoCapability));
    }

    #[tokio::test]
    async fn test_single_http_500() {
        let host = StubHost::default().respond("https://x/a.jpg", 500, b"oops");
        let orch = orchestrator(&host, OrchestratorSettings::default());

        let result = orch.download_single(&image("https://x/a.jpg")).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.status, DownloadStatus::Error);
        assert!(result.error.unwrap().contains("HTTP 500"));
        assert_eq!(result.failures[0].http_status, Some(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_native_timeout() {
        let host = StubHost {
            hook: Some(Arc::new(NeverHook)),
            ..Default::default()
        }
        .respond("https://x/a.mp4", 200, b"mp4");
        let orch = orchestrator(&host, OrchestratorSettings::default());
        assert_eq!(orch.capabilities().method, Some(DownloadMethod::NativeHook));

        let result = orch.download_single(&image("https://x/a.mp4")).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Timeout"));
        assert!(host.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_single_item_bulk_skips_archive() {
        let host = StubHost::default().respond("https://x/a.jpg", 200, b"a");
        let orch = orchestrator(&host, OrchestratorSettings::default());

        let result = orch
            .download_bulk(&[image("https://x/a.jpg")], BulkOptions::default())
            .await
            .unwrap();

        assert_eq!(result.status, DownloadStatus::Success);
        assert!(result.zip_data.is_none());
        assert_eq!(host.delivered()[0].0, "alice_100_1.jpg");
    }

    #[tokio::test]
    async fn test_cancel_stops_new_items() {
        let host = StubHost::default().respond("https://x/a.jpg", 200, b"a");
        let orch = orchestrator(&host, OrchestratorSettings::default());
        orch.cancel();

        let result = orch
            .download_bulk(
                &[image("https://x/a.jpg"), image("https://x/a.jpg")],
                BulkOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(result.status, DownloadStatus::Error);
        assert!(result.failures.iter().all(|f| f.error == "Download cancelled"));
        assert!(host.state.lock().unwrap().fetch_calls.is_empty());

        orch.resume();
        let result = orch.download_single(&image("https://x/a.jpg")).await.unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_redetect_picks_up_new_capabilities() {
        let host = StubHost {
            no_blob: true,
            ..Default::default()
        };
        let mut orch = orchestrator(&host, OrchestratorSettings::default());
        assert_eq!(orch.capabilities().method, Some(DownloadMethod::Anchor));

        orch.host = Arc::new(StubHost::default());
        assert_eq!(orch.redetect().method, Some(DownloadMethod::FetchBlob));
    }

    #[tokio::test]
    async fn test_progress_events() {
        let host = StubHost::default()
            .respond("https://x/a.jpg", 200, b"a")
            .respond("https://x/b.jpg", 200, b"b");
        let orch = orchestrator(&host, OrchestratorSettings::default());
        let mut rx = orch.events.subscribe();

        orch.download_bulk(
            &[image("https://x/a.jpg"), image("https://x/b.jpg")],
            BulkOptions::default(),
        )
        .await
        .unwrap();

        let mut phases = Vec::new();
        let mut finished = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                GalleryEvent::DownloadProgress { phase, .. } => phases.push(phase),
                GalleryEvent::DownloadFinished { status, .. } => {
                    assert_eq!(status, "success");
                    finished = true;
                }
                _ => {}
            }
        }

        assert_eq!(phases.first(), Some(&DownloadPhase::Preparing));
        assert!(phases.contains(&DownloadPhase::Zipping));
        assert_eq!(phases.last(), Some(&DownloadPhase::Complete));
        assert!(finished);
    }
}
