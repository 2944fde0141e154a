//! Host implementation backed by reqwest and the local filesystem.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header, Client};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::config::Config;
use crate::download::host::{
    AnchorDownloader, BlobStore, FetchResponse, Fetcher, HookOutcome, HostEnvironment,
    NativeDownloadHook,
};
use crate::error::{Error, Result};
use crate::fs::{make_unique_filename, sanitize_filename};
use crate::output::create_download_bar;

/// Minimum file size to show progress bar (20 MB).
const PROGRESS_THRESHOLD: u64 = 20 * 1024 * 1024;

const BLOB_SCHEME: &str = "blob:";

/// Object URLs kept in memory until revoked.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn get(&self, url: &str) -> Option<Vec<u8>> {
        self.objects.lock().ok()?.get(url).cloned()
    }

    /// Number of live object URLs.
    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryBlobStore {
    fn create_object_url(&self, data: Vec<u8>, mime: &str) -> String {
        let url = format!("{}xcom-gallery/{}", BLOB_SCHEME, uuid::Uuid::new_v4());
        tracing::debug!("Created object URL {} ({}, {} bytes)", url, mime, data.len());
        if let Ok(mut objects) = self.objects.lock() {
            objects.insert(url.clone(), data);
        }
        url
    }

    fn revoke_object_url(&self, url: &str) {
        if let Ok(mut objects) = self.objects.lock() {
            objects.remove(url);
        }
    }
}

/// Plain GET through reqwest.
pub struct ReqwestFetcher {
    client: Client,
    user_agent: String,
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let response = self
            .client
            .get(url)
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(FetchResponse {
            status,
            body,
            content_type,
        })
    }
}

/// Writes downloads into the download directory.
///
/// Serves as both the native save hook and the anchor fallback: object URLs
/// are resolved from the blob store, anything else is streamed over HTTP.
pub struct LocalSaver {
    client: Client,
    user_agent: String,
    download_dir: PathBuf,
    blobs: Arc<MemoryBlobStore>,
    show_progress: bool,
}

impl LocalSaver {
    pub async fn save_to_disk(&self, url: &str, filename: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.download_dir).await?;

        let name = sanitize_filename(filename)?;
        let output_path = make_unique_filename(&self.download_dir.join(name));

        if url.starts_with(BLOB_SCHEME) {
            let data = self
                .blobs
                .get(url)
                .ok_or_else(|| Error::Download(format!("Unknown object URL: {}", url)))?;
            tokio::fs::write(&output_path, data).await?;
        } else {
            self.stream_to_file(url, &output_path).await?;
        }

        tracing::info!("Saved {}", output_path.display());
        Ok(output_path)
    }

    async fn stream_to_file(&self, url: &str, output_path: &Path) -> Result<()> {
        let response = self
            .client
            .get(url)
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let content_length = response.content_length();
        let progress = if self.show_progress
            && content_length.map(|l| l > PROGRESS_THRESHOLD).unwrap_or(false)
        {
            Some(create_download_bar(content_length.unwrap_or(0)))
        } else {
            None
        };

        let mut file = File::create(output_path).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Download(format!("Stream error: {}", e)))?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if let Some(ref pb) = progress {
                pb.set_position(downloaded);
            }
        }

        file.flush().await?;

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        Ok(())
    }
}

#[async_trait]
impl NativeDownloadHook for LocalSaver {
    async fn save(&self, url: &str, filename: &str) -> HookOutcome {
        match self.save_to_disk(url, filename).await {
            Ok(_) => HookOutcome::Loaded,
            Err(Error::Timeout) => HookOutcome::TimedOut,
            Err(e) => HookOutcome::Failed(e.to_string()),
        }
    }
}

#[async_trait]
impl AnchorDownloader for LocalSaver {
    async fn click(&self, href: &str, filename: &str) -> Result<()> {
        self.save_to_disk(href, filename).await.map(|_| ())
    }
}

/// The host used by the command line tool.
pub struct LocalHost {
    fetcher: Arc<ReqwestFetcher>,
    saver: Arc<LocalSaver>,
    blobs: Arc<MemoryBlobStore>,
    native_hook: bool,
}

impl LocalHost {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.account.user_agent)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(
            client,
            &config.account.user_agent,
            config.download_directory(),
            config.options.native_hook,
        ))
    }

    pub fn with_client(
        client: Client,
        user_agent: &str,
        download_dir: PathBuf,
        native_hook: bool,
    ) -> Self {
        let blobs = Arc::new(MemoryBlobStore::default());
        let fetcher = Arc::new(ReqwestFetcher {
            client: client.clone(),
            user_agent: user_agent.to_string(),
        });
        let saver = Arc::new(LocalSaver {
            client,
            user_agent: user_agent.to_string(),
            download_dir,
            blobs: blobs.clone(),
            show_progress: true,
        });

        Self {
            fetcher,
            saver,
            blobs,
            native_hook,
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.saver.download_dir
    }

    pub fn blobs(&self) -> &Arc<MemoryBlobStore> {
        &self.blobs
    }
}

impl HostEnvironment for LocalHost {
    fn native_download_hook(&self) -> Option<Arc<dyn NativeDownloadHook>> {
        if self.native_hook {
            Some(self.saver.clone() as Arc<dyn NativeDownloadHook>)
        } else {
            None
        }
    }

    fn fetcher(&self) -> Option<Arc<dyn Fetcher>> {
        Some(self.fetcher.clone() as Arc<dyn Fetcher>)
    }

    fn blob_store(&self) -> Option<Arc<dyn BlobStore>> {
        Some(self.blobs.clone() as Arc<dyn BlobStore>)
    }

    fn anchor(&self) -> Arc<dyn AnchorDownloader> {
        self.saver.clone()
    }
}
