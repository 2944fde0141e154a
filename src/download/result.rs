//! Download outcomes.

use std::fmt;

use serde::Serialize;

use crate::download::capability::DownloadMethod;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Success,
    Partial,
    Error,
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadStatus::Success => write!(f, "success"),
            DownloadStatus::Partial => write!(f, "partial"),
            DownloadStatus::Error => write!(f, "error"),
        }
    }
}

/// One item that could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadFailure {
    pub url: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
}

impl DownloadFailure {
    pub fn from_error(url: impl Into<String>, err: &Error) -> Self {
        Self {
            url: url.into(),
            error: err.to_string(),
            http_status: err.http_status(),
        }
    }
}

/// Aggregate outcome of a single or bulk download.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadResult {
    pub success: bool,
    pub status: DownloadStatus,
    pub files_processed: usize,
    pub files_successful: usize,
    pub failures: Vec<DownloadFailure>,
    /// Archive bytes, when the bulk path packaged one.
    #[serde(skip)]
    pub zip_data: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<DownloadMethod>,
}

impl DownloadResult {
    /// Aggregate `processed` attempts of which `failures` went wrong.
    pub fn aggregate(processed: usize, failures: Vec<DownloadFailure>) -> Self {
        let failed = failures.len().min(processed);
        let successful = processed - failed;

        let status = if failures.is_empty() {
            DownloadStatus::Success
        } else if successful == 0 {
            DownloadStatus::Error
        } else {
            DownloadStatus::Partial
        };

        let error = match status {
            DownloadStatus::Success => None,
            DownloadStatus::Partial => Some(format!(
                "{} of {} files failed to download",
                failed, processed
            )),
            DownloadStatus::Error if failures.len() == 1 => Some(failures[0].error.clone()),
            DownloadStatus::Error => Some(format!(
                "All {} files failed: {}",
                failures.len(),
                failures[0].error
            )),
        };

        Self {
            success: status != DownloadStatus::Error,
            status,
            files_processed: processed,
            files_successful: successful,
            failures,
            zip_data: None,
            filename: None,
            error,
            method: None,
        }
    }

    /// Result for a call with nothing to do.
    pub fn empty() -> Self {
        Self {
            success: false,
            status: DownloadStatus::Error,
            files_processed: 0,
            files_successful: 0,
            failures: Vec::new(),
            zip_data: None,
            filename: None,
            error: Some("No files to download".to_string()),
            method: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_method(mut self, method: DownloadMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_zip_data(mut self, data: Vec<u8>) -> Self {
        self.zip_data = Some(data);
        self
    }

    pub fn is_partial(&self) -> bool {
        self.status == DownloadStatus::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(url: &str, status: u16) -> DownloadFailure {
        DownloadFailure::from_error(
            url,
            &Error::HttpStatus {
                status,
                url: url.to_string(),
            },
        )
    }

    #[test]
    fn test_all_ok() {
        let result = DownloadResult::aggregate(3, Vec::new());
        assert!(result.success);
        assert_eq!(result.status, DownloadStatus::Success);
        assert_eq!(result.files_successful, 3);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_partial() {
        let result = DownloadResult::aggregate(2, vec![failure("https://x/bad.jpg", 404)]);
        assert!(result.success);
        assert!(result.is_partial());
        assert_eq!(result.files_successful, 1);
        assert_eq!(result.failures[0].http_status, Some(404));
        assert!(result.failures[0].error.to_lowercase().contains("http"));
    }

    #[test]
    fn test_all_failed() {
        let result = DownloadResult::aggregate(1, vec![failure("https://x/a.jpg", 500)]);
        assert!(!result.success);
        assert_eq!(result.status, DownloadStatus::Error);
        assert_eq!(result.files_successful, 0);
        assert!(result.error.unwrap().contains("HTTP 500"));
    }

    #[test]
    fn test_all_failed_many_summarizes() {
        let result = DownloadResult::aggregate(
            2,
            vec![failure("https://x/a.jpg", 500), failure("https://x/b.jpg", 404)],
        );
        assert_eq!(result.status, DownloadStatus::Error);
        assert!(result.error.unwrap().starts_with("All 2 files failed"));
    }

    #[test]
    fn test_empty() {
        let result = DownloadResult::empty();
        assert!(!result.success);
        assert_eq!(result.status, DownloadStatus::Error);
        assert_eq!(result.error.as_deref(), Some("No files to download"));
    }

    #[test]
    fn test_timeout_failure_message() {
        let failure = DownloadFailure::from_error("https://x/a.mp4", &Error::Timeout);
        assert_eq!(failure.error, "Timeout");
        assert_eq!(failure.http_status, None);
    }
}
