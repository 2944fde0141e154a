//! Download capability detection.

use std::fmt;

use serde::Serialize;

use crate::download::host::HostEnvironment;

/// Delivery mechanism, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DownloadMethod {
    NativeHook,
    FetchBlob,
    Anchor,
}

impl fmt::Display for DownloadMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadMethod::NativeHook => write!(f, "native-hook"),
            DownloadMethod::FetchBlob => write!(f, "fetch-blob"),
            DownloadMethod::Anchor => write!(f, "anchor"),
        }
    }
}

/// What the host can do, and the method picked from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub has_native_download_hook: bool,
    pub has_fetch: bool,
    pub has_blob: bool,
    pub method: Option<DownloadMethod>,
}

impl Capabilities {
    pub fn new(has_native_download_hook: bool, has_fetch: bool, has_blob: bool) -> Self {
        let method = if has_native_download_hook {
            Some(DownloadMethod::NativeHook)
        } else if has_fetch && has_blob {
            Some(DownloadMethod::FetchBlob)
        } else if has_fetch || has_blob {
            Some(DownloadMethod::Anchor)
        } else {
            None
        };

        Self {
            has_native_download_hook,
            has_fetch,
            has_blob,
            method,
        }
    }

    /// Archives need both fetching and an object URL to hand over.
    pub fn can_package(&self) -> bool {
        self.has_fetch && self.has_blob
    }
}

/// Probe `host` once.
pub fn detect_capabilities(host: &dyn HostEnvironment) -> Capabilities {
    let caps = Capabilities::new(
        host.native_download_hook().is_some(),
        host.fetcher().is_some(),
        host.blob_store().is_some(),
    );
    tracing::debug!(
        "Capabilities: hook={} fetch={} blob={} -> {:?}",
        caps.has_native_download_hook,
        caps.has_fetch,
        caps.has_blob,
        caps.method
    );
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_hook_wins() {
        assert_eq!(
            Capabilities::new(true, true, true).method,
            Some(DownloadMethod::NativeHook)
        );
        assert_eq!(
            Capabilities::new(true, false, false).method,
            Some(DownloadMethod::NativeHook)
        );
    }

    #[test]
    fn test_fetch_blob_needs_both() {
        assert_eq!(
            Capabilities::new(false, true, true).method,
            Some(DownloadMethod::FetchBlob)
        );
        assert_eq!(
            Capabilities::new(false, true, false).method,
            Some(DownloadMethod::Anchor)
        );
        assert_eq!(
            Capabilities::new(false, false, true).method,
            Some(DownloadMethod::Anchor)
        );
    }

    #[test]
    fn test_nothing_available() {
        let caps = Capabilities::new(false, false, false);
        assert_eq!(caps.method, None);
        assert!(!caps.can_package());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(DownloadMethod::FetchBlob.to_string(), "fetch-blob");
    }
}
