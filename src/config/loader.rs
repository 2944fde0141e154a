//! Configuration structures and loading logic.

use crate::config::modes::ExtractionMode;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub options: OptionsConfig,
}

/// Session credentials used by the tweet API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Value of the `auth_token` session cookie.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Value of the `ct0` cookie, echoed back as the CSRF header.
    #[serde(default)]
    pub csrf_token: Option<String>,

    /// Bearer token sent with every API request.
    #[serde(default = "default_bearer_token")]
    pub bearer_token: String,

    /// Browser user agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Pipeline options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Base directory for downloads.
    #[serde(default)]
    pub download_directory: Option<PathBuf>,

    /// Default extraction mode.
    #[serde(default)]
    pub extraction_mode: ExtractionMode,

    /// Package bulk downloads into a single archive.
    #[serde(default = "default_true")]
    pub zip_enabled: bool,

    /// Bulk downloads with at most this many items are saved individually.
    #[serde(default = "default_single_threshold")]
    pub single_threshold: usize,

    /// Concurrent fetches while collecting archive entries.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Extra attempts per item when a fetch fails transiently.
    #[serde(default = "default_item_retries")]
    pub item_retries: u32,

    /// Expose the native save hook of the local host.
    #[serde(default = "default_true")]
    pub native_hook: bool,

    /// Seconds before a native save is reported as timed out.
    #[serde(default = "default_native_hook_timeout")]
    pub native_hook_timeout_secs: u64,

    /// Seconds before a tweet API request is abandoned.
    #[serde(default = "default_api_timeout")]
    pub api_timeout_secs: u64,

    /// Retries granted to the API strategy inside the extraction chain.
    #[serde(default = "default_strategy_retries")]
    pub strategy_retries: u32,

    /// Linear backoff base between strategy retries, in milliseconds.
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    /// Prefix used when no tweet metadata is available for a filename.
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            download_directory: None,
            extraction_mode: ExtractionMode::default(),
            zip_enabled: true,
            single_threshold: default_single_threshold(),
            concurrency: default_concurrency(),
            item_retries: default_item_retries(),
            native_hook: true,
            native_hook_timeout_secs: default_native_hook_timeout(),
            api_timeout_secs: default_api_timeout(),
            strategy_retries: default_strategy_retries(),
            backoff_base_ms: default_backoff_base(),
            filename_prefix: default_filename_prefix(),
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            auth_token: None,
            csrf_token: None,
            bearer_token: default_bearer_token(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_bearer_token() -> String {
    "AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36".to_string()
}

fn default_true() -> bool {
    true
}

fn default_single_threshold() -> usize {
    1
}

fn default_concurrency() -> usize {
    4
}

fn default_item_retries() -> u32 {
    1
}

fn default_native_hook_timeout() -> u64 {
    30
}

fn default_api_timeout() -> u64 {
    10
}

fn default_strategy_retries() -> u32 {
    1
}

fn default_backoff_base() -> u64 {
    200
}

fn default_filename_prefix() -> String {
    "xcom_gallery".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}. Create one from config.example.toml",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the effective download directory.
    ///
    /// Falls back to the user's download folder, then the working directory.
    pub fn download_directory(&self) -> PathBuf {
        if let Some(dir) = &self.options.download_directory {
            return dir.clone();
        }

        directories::UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn native_hook_timeout(&self) -> Duration {
        Duration::from_secs(self.options.native_hook_timeout_secs)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.options.api_timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.options.backoff_base_ms)
    }
}
