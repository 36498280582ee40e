//! Core types used throughout the downloader system
//!
//! This module contains the fundamental types that all other modules depend on,
//! including the progress model shared with the archive extractor.

pub mod error;
pub mod files;
pub mod progress;

// Re-export main types for convenience
pub use error::{DownloadError, FileOperation, Result};
pub use progress::{
    ConsoleProgressReporter, IntoProgressCallback, NullProgressReporter, ProgressCallback,
    ProgressEvent, ProgressReporter, ProgressState,
};

use serde::Deserialize;

/// Where a file can be fetched from.
///
/// A single URL is tried once; a mirror list is tried in order until one
/// attempt succeeds. Deserializes from either a JSON string or an array of
/// strings, anything else is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UrlSource {
    Single(String),
    Mirrors(Vec<String>),
}

impl UrlSource {
    /// All candidate URLs in priority order
    pub fn urls(&self) -> Vec<&str> {
        match self {
            UrlSource::Single(url) => vec![url.as_str()],
            UrlSource::Mirrors(urls) => urls.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for UrlSource {
    fn from(url: &str) -> Self {
        UrlSource::Single(url.to_string())
    }
}

impl From<String> for UrlSource {
    fn from(url: String) -> Self {
        UrlSource::Single(url)
    }
}

impl From<Vec<String>> for UrlSource {
    fn from(urls: Vec<String>) -> Self {
        UrlSource::Mirrors(urls)
    }
}

impl From<Vec<&str>> for UrlSource {
    fn from(urls: Vec<&str>) -> Self {
        UrlSource::Mirrors(urls.into_iter().map(str::to_string).collect())
    }
}

/// Result of a successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// The URL that produced the file
    pub url: String,
    /// Bytes written to the destination
    pub size: u64,
}
