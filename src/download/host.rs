//! Host environment abstractions.
//!
//! The pipeline never touches the network or the filesystem directly; it asks
//! the host for whichever delivery mechanisms it offers. [`LocalHost`]
//! (see `local.rs`) is the real implementation, tests plug in stubs.
//!
//! [`LocalHost`]: crate::download::LocalHost

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Outcome reported by a native download hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    Loaded,
    Failed(String),
    TimedOut,
}

/// A host-provided "save this URL as that filename" primitive.
#[async_trait]
pub trait NativeDownloadHook: Send + Sync {
    async fn save(&self, url: &str, filename: &str) -> HookOutcome;
}

/// Raw HTTP response from a [`Fetcher`].
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: None,
        }
    }

    /// 2xx.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`. Only transport failures are errors; any HTTP status is a response.
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}

/// In-memory object URLs for fetched payloads.
pub trait BlobStore: Send + Sync {
    fn create_object_url(&self, data: Vec<u8>, mime: &str) -> String;
    fn revoke_object_url(&self, url: &str);
}

/// "Click a link with a download attribute".
#[async_trait]
pub trait AnchorDownloader: Send + Sync {
    async fn click(&self, href: &str, filename: &str) -> Result<()>;
}

/// Everything the download layer may ask of its host.
pub trait HostEnvironment: Send + Sync {
    fn native_download_hook(&self) -> Option<Arc<dyn NativeDownloadHook>>;
    fn fetcher(&self) -> Option<Arc<dyn Fetcher>>;
    fn blob_store(&self) -> Option<Arc<dyn BlobStore>>;
    fn anchor(&self) -> Arc<dyn AnchorDownloader>;
}

/// Object URL that is revoked when dropped.
pub struct BlobUrlGuard {
    store: Arc<dyn BlobStore>,
    url: String,
}

impl BlobUrlGuard {
    pub fn create(store: Arc<dyn BlobStore>, data: Vec<u8>, mime: &str) -> Self {
        let url = store.create_object_url(data, mime);
        Self { store, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for BlobUrlGuard {
    fn drop(&mut self) {
        tracing::debug!("Revoking object URL {}", self.url);
        self.store.revoke_object_url(&self.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingStore {
        live: Mutex<Vec<String>>,
    }

    impl BlobStore for CountingStore {
        fn create_object_url(&self, _data: Vec<u8>, _mime: &str) -> String {
            let mut live = self.live.lock().unwrap();
            let url = format!("blob:test/{}", live.len());
            live.push(url.clone());
            url
        }

        fn revoke_object_url(&self, url: &str) {
            self.live.lock().unwrap().retain(|u| u != url);
        }
    }

    #[test]
    fn test_fetch_response_ok_range() {
        assert!(FetchResponse::new(200, b"x".to_vec()).ok());
        assert!(FetchResponse::new(204, Vec::new()).ok());
        assert!(!FetchResponse::new(404, b"not found".to_vec()).ok());
        assert!(!FetchResponse::new(500, Vec::new()).ok());
    }

    #[test]
    fn test_guard_revokes_on_drop() {
        let store = Arc::new(CountingStore::default());
        {
            let guard = BlobUrlGuard::create(store.clone(), vec![1, 2], "image/jpeg");
            assert!(guard.url().starts_with("blob:"));
            assert_eq!(store.live.lock().unwrap().len(), 1);
        }
        assert!(store.live.lock().unwrap().is_empty());
    }
}
