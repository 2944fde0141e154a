//! Delivery of exactly one resource through a chosen method.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::download::capability::DownloadMethod;
use crate::download::host::{BlobUrlGuard, HookOutcome, HostEnvironment, NativeDownloadHook};
use crate::error::{Error, Result};

/// Runs one download through the host, normalizing the outcome into `Result`.
pub struct SingleDownloadExecutor {
    host: Arc<dyn HostEnvironment>,
    hook_timeout: Duration,
}

impl SingleDownloadExecutor {
    pub fn new(host: Arc<dyn HostEnvironment>, hook_timeout: Duration) -> Self {
        Self { host, hook_timeout }
    }

    /// Download `url` and save it as `filename`.
    ///
    /// A native hook timeout is final: no other method is tried.
    pub async fn download(&self, method: DownloadMethod, url: &str, filename: &str) -> Result<()> {
        tracing::debug!("Downloading {} as {} via {}", url, filename, method);

        match method {
            DownloadMethod::NativeHook => {
                let hook = self.host.native_download_hook().ok_or(Error::NoCapability)?;
                self.run_hook(hook.as_ref(), url, filename).await
            }
            DownloadMethod::FetchBlob => {
                let data = self.fetch_bytes(url).await?;
                self.deliver_blob(DownloadMethod::Anchor, data, &mime_for(filename), filename)
                    .await
            }
            DownloadMethod::Anchor => self.host.anchor().click(url, filename).await,
        }
    }

    /// Fetch `url`, treating any non-2xx response as a failure even when it has a body.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let fetcher = self.host.fetcher().ok_or(Error::NoCapability)?;
        let response = fetcher.fetch(url).await?;

        if !response.ok() {
            return Err(Error::HttpStatus {
                status: response.status,
                url: url.to_string(),
            });
        }

        Ok(response.body)
    }

    /// Hand in-memory `data` to the host as `filename`.
    ///
    /// The object URL is revoked whatever the outcome.
    pub async fn deliver_bytes(
        &self,
        method: DownloadMethod,
        data: Vec<u8>,
        mime: &str,
        filename: &str,
    ) -> Result<()> {
        self.deliver_blob(method, data, mime, filename).await
    }

    async fn deliver_blob(
        &self,
        method: DownloadMethod,
        data: Vec<u8>,
        mime: &str,
        filename: &str,
    ) -> Result<()> {
        let store = self.host.blob_store().ok_or(Error::NoCapability)?;
        let guard = BlobUrlGuard::create(store, data, mime);

        match (method, self.host.native_download_hook()) {
            (DownloadMethod::NativeHook, Some(hook)) => {
                self.run_hook(hook.as_ref(), guard.url(), filename).await
            }
            _ => self.host.anchor().click(guard.url(), filename).await,
        }
    }

    async fn run_hook(&self, hook: &dyn NativeDownloadHook, url: &str, filename: &str) -> Result<()> {
        match timeout(self.hook_timeout, hook.save(url, filename)).await {
            Ok(HookOutcome::Loaded) => Ok(()),
            Ok(HookOutcome::Failed(message)) => Err(Error::Download(message)),
            Ok(HookOutcome::TimedOut) | Err(_) => {
                tracing::warn!("Native download of {} timed out", filename);
                Err(Error::Timeout)
            }
        }
    }
}

fn mime_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}
