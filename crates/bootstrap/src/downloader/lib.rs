//! Main entry point for fetching files
//!
//! The call chain flows as follows:
//!
//! User Code
//! ↓
//! Downloader (this file): single URL or ordered mirror fallback
//! ↓
//! DownloaderRegistry (registry.rs): scheme routing
//! ↓
//! HttpDownloader (backends/http.rs): streaming + progress
//! ↓
//! Core types (core/*)

use crate::downloader::{
    config::DownloadConfig,
    core::{
        DownloadError, DownloadResult, ProgressCallback, ProgressEvent, Result, UrlSource,
        files::{ensure_parent_dir, remove_partial},
    },
    registry::DownloaderRegistry,
};
use std::path::Path;
use tracing::{debug, warn};

/// Fetches files from a URL or an ordered list of mirrors
///
/// Mirrors are tried strictly one after another; there is no racing and no
/// retry of a mirror that already failed.
pub struct Downloader {
    registry: DownloaderRegistry,
}

impl Downloader {
    /// Create a new downloader with the default HTTP backend
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let registry = DownloaderRegistry::new().with_http_downloader(config)?;
        Ok(Self { registry })
    }

    /// Create a downloader with a custom registry
    pub fn with_registry(registry: DownloaderRegistry) -> Self {
        Self { registry }
    }

    /// Fetch `source` into `destination`.
    ///
    /// Parent directories are created first. A failed attempt never leaves a
    /// file at `destination`: a single URL propagates its own error, a mirror
    /// list ends with [`DownloadError::AllMirrorsFailed`] once every mirror
    /// has been tried.
    pub async fn fetch(
        &self,
        source: &UrlSource,
        destination: &Path,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<DownloadResult> {
        match source {
            UrlSource::Single(url) => {
                ensure_parent_dir(destination).await?;
                self.attempt(url, destination, progress_callback).await
            }
            UrlSource::Mirrors(urls) => self.fetch_mirrors(urls, destination, progress_callback).await,
        }
    }

    async fn fetch_mirrors(
        &self,
        urls: &[String],
        destination: &Path,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<DownloadResult> {
        if urls.is_empty() {
            return Err(DownloadError::Configuration {
                message: format!("No mirror URLs given for '{}'", destination.display()),
            });
        }

        ensure_parent_dir(destination).await?;

        let mut attempts = Vec::with_capacity(urls.len());
        for url in urls {
            debug!("Trying mirror {}", url);

            match self.attempt(url, destination, progress_callback.clone()).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_mirror_failure() => {
                    let message = e.detailed_message();
                    warn!("Mirror {} failed ({}): {}. Proceeding with backup...", url, e.category(), message);

                    if let Some(ref callback) = progress_callback {
                        callback(ProgressEvent::MirrorFailed {
                            url: url.clone(),
                            error: message.clone(),
                        });
                    }
                    attempts.push(format!("{}: {}", url, message));
                }
                Err(e) => return Err(e),
            }
        }

        Err(DownloadError::AllMirrorsFailed {
            destination: destination.to_path_buf(),
            attempts,
        })
    }

    /// One download attempt; removes the destination again if it fails
    async fn attempt(
        &self,
        url: &str,
        destination: &Path,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<DownloadResult> {
        let outcome = match self.registry.find_downloader(url) {
            Ok(downloader) => downloader.download_to_file(url, destination, progress_callback).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(size) => Ok(DownloadResult {
                url: url.to_string(),
                size,
            }),
            Err(e) => {
                if let Err(cleanup) = remove_partial(destination).await {
                    warn!("Could not remove partial file: {}", cleanup.detailed_message());
                }
                Err(e)
            }
        }
    }
}
