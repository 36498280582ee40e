//! Downloader registry for routing URLs to download implementations
//!
//! The registry pattern allows supporting different download protocols
//! behind one interface. The mirror loop asks the registry for a backend
//! per URL, so a mirror with an unknown scheme simply fails that attempt.

use crate::downloader::{
    backends::HttpDownloader,
    config::DownloadConfig,
    core::{DownloadError, ProgressCallback, Result},
};
use async_trait::async_trait;
use std::path::Path;

/// Trait for different download implementations
#[async_trait]
pub trait FileDownloader: Send + Sync {
    /// Download `url` into `dest_path`, returning the number of bytes written.
    ///
    /// The destination's parent directory already exists. On error the
    /// caller removes whatever was written.
    async fn download_to_file(
        &self,
        url: &str,
        dest_path: &Path,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<u64>;

    /// URL schemes handled by this downloader
    fn schemes(&self) -> &[&'static str];

    /// Check if this downloader supports the given URL scheme
    fn supports_scheme(&self, scheme: &str) -> bool {
        self.schemes().iter().any(|s| s.eq_ignore_ascii_case(scheme))
    }
}

/// Registry for managing multiple downloader implementations
pub struct DownloaderRegistry {
    downloaders: Vec<Box<dyn FileDownloader>>,
}

impl DownloaderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            downloaders: Vec::new(),
        }
    }

    /// Register a new downloader implementation
    pub fn register<D: FileDownloader + 'static>(mut self, downloader: D) -> Self {
        self.downloaders.push(Box::new(downloader));
        self
    }

    /// Add an HTTP downloader with the given configuration
    pub fn with_http_downloader(self, config: DownloadConfig) -> Result<Self> {
        Ok(self.register(HttpDownloader::new(config)?))
    }

    /// Find the downloader for a given URL
    ///
    /// Returns `InvalidUrl` if the URL does not parse and `UnsupportedUrl`
    /// if no registered downloader handles its scheme.
    pub fn find_downloader(&self, url: &str) -> Result<&dyn FileDownloader> {
        let parsed = url::Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
            url: url.to_string(),
            source: e,
        })?;
        let scheme = parsed.scheme();

        self.downloaders
            .iter()
            .find(|d| d.supports_scheme(scheme))
            .map(|d| d.as_ref())
            .ok_or_else(|| DownloadError::UnsupportedUrl {
                url: url.to_string(),
                scheme: scheme.to_string(),
                supported_schemes: self.supported_schemes().join(", "),
            })
    }

    fn supported_schemes(&self) -> Vec<&'static str> {
        self.downloaders
            .iter()
            .flat_map(|d| d.schemes().iter().copied())
            .collect()
    }
}

impl Default for DownloaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
