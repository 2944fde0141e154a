//! Filename generation and manipulation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::{Error, Result};
use crate::media::MediaItem;

/// Validate and sanitize a filename by removing or replacing invalid characters.
///
/// Returns an error if the filename contains path traversal patterns.
pub fn sanitize_filename(name: &str) -> Result<String> {
    // Reject path traversal attempts
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(Error::InvalidFilename(format!(
            "Path separators not allowed in filename: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed in filename: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Filename cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Sanitize a name component, replacing separators instead of rejecting them.
///
/// Used for usernames and ids that end up inside generated filenames.
pub fn sanitize_path_component(name: &str) -> Result<String> {
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Path component cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], Some(&name[pos + 1..])),
        _ => (name, None),
    }
}

fn numbered(stem: &str, ext: Option<&str>, counter: usize) -> String {
    match ext {
        Some(ext) => format!("{}_{}.{}", stem, counter, ext),
        None => format!("{}_{}", stem, counter),
    }
}

/// Generate a unique filename by appending a number if the file exists.
pub fn make_unique_filename(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    let (stem, ext) = split_extension(name);
    let parent = path.parent().unwrap_or(Path::new("."));

    let mut counter = 1;
    loop {
        let new_path = parent.join(numbered(stem, ext, counter));
        if !new_path.exists() {
            return new_path;
        }

        counter += 1;
        if counter > 1000 {
            // Safety limit
            return new_path;
        }
    }
}

/// In-memory counterpart of [`make_unique_filename`]: `a.jpg` becomes
/// `a_1.jpg`, `a_2.jpg`, ... until it is not in `taken`. The returned name
/// is recorded in `taken`.
pub fn make_unique_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, ext) = split_extension(name);
    let mut counter = 1;
    loop {
        let candidate = numbered(stem, ext, counter);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Naming policy for saved media and archives.
pub trait FilenameResolver: Send + Sync {
    /// Filename for the `index`-th (0-based) item of a download.
    fn resolve(&self, item: &MediaItem, index: usize) -> String;

    /// Filename for an archive holding `items`.
    fn resolve_zip(&self, items: &[MediaItem]) -> String;
}

/// `{username}_{tweetId}_{n}.{ext}` with a 1-based `n`.
///
/// Without tweet metadata the configured prefix stands in for the username
/// and the media id for the tweet id.
#[derive(Debug, Clone)]
pub struct TweetFilenameResolver {
    prefix: String,
}

impl TweetFilenameResolver {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn component(&self, value: &str) -> String {
        sanitize_path_component(value).unwrap_or_else(|_| self.prefix.clone())
    }
}

impl Default for TweetFilenameResolver {
    fn default() -> Self {
        Self::new("xcom_gallery")
    }
}

impl FilenameResolver for TweetFilenameResolver {
    fn resolve(&self, item: &MediaItem, index: usize) -> String {
        if let Some(name) = item.filename.as_deref() {
            if let Ok(name) = sanitize_filename(name) {
                return name;
            }
        }

        let ext = item.extension();
        let owner = item
            .tweet_username
            .as_deref()
            .map(|u| self.component(u))
            .unwrap_or_else(|| self.prefix.clone());
        let id = item
            .tweet_id
            .as_deref()
            .unwrap_or(item.id.as_str());

        format!("{}_{}_{}.{}", owner, self.component(id), index + 1, ext)
    }

    fn resolve_zip(&self, items: &[MediaItem]) -> String {
        let first = items.first();
        let same_tweet = first
            .and_then(|f| f.tweet_id.as_ref())
            .map(|id| items.iter().all(|i| i.tweet_id.as_ref() == Some(id)))
            .unwrap_or(false);

        match first {
            Some(item) if same_tweet => {
                let owner = item
                    .tweet_username
                    .as_deref()
                    .map(|u| self.component(u))
                    .unwrap_or_else(|| self.prefix.clone());
                let id = item.tweet_id.as_deref().unwrap_or_default();
                format!("{}_{}.zip", owner, self.component(id))
            }
            _ => format!("{}_{}.zip", self.prefix, Utc::now().format("%Y%m%d_%H%M%S")),
        }
    }
}
