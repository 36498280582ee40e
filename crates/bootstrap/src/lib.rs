//! Bootstrap Library
//!
//! Acquires third-party SDKs for a development environment: fetch an archive
//! from an ordered list of mirrors, unpack it next to itself, and register the
//! install directory in the system environment.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bootstrap::{
//!     ConsoleProgressReporter, DownloadConfig, Downloader, EnvStoreConfig,
//!     EnvironmentStore, IntoProgressCallback, Scope, UrlSource,
//! };
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = Downloader::new(DownloadConfig::default())?;
//! let progress = ConsoleProgressReporter::new().into_callback();
//!
//! // Mirrors are tried in order until one succeeds
//! let archive = Path::new("vendor/VulkanSDK/sdk.zip");
//! let source = UrlSource::from(vec![
//!     "https://mirror-a.example.com/sdk.zip",
//!     "https://mirror-b.example.com/sdk.zip",
//! ]);
//! downloader.fetch(&source, archive, Some(progress.clone())).await?;
//!
//! // Unpack into vendor/VulkanSDK and remove the archive
//! let extractor = bootstrap::extract::for_host()?;
//! extractor.extract(archive, true, Some(progress))?;
//!
//! // Register the install directory
//! let store = bootstrap::env::for_host(&EnvStoreConfig::default());
//! if store.get(Scope::System, "VULKAN_SDK")?.is_none() {
//!     store.set(Scope::System, "VULKAN_SDK", "vendor/VulkanSDK")?;
//!     store.add_to_path("vendor/VulkanSDK/bin")?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Mirror fallback**: strictly ordered, partial files removed after every failed attempt
//! - **Progress tracking**: chunked writes with a console bar and average throughput
//! - **Archive extraction**: zip with per-entry progress and re-run skipping, tar/tar.gz in one pass
//! - **Environment store**: registry on Windows, live environment plus a persisted file elsewhere

pub mod downloader;
pub mod env;
pub mod extract;

// Re-export commonly used types for convenience
pub use downloader::{
    ConsoleProgressReporter, DownloadConfig, DownloadError, DownloadResult, Downloader,
    IntoProgressCallback, NullProgressReporter, ProgressCallback, ProgressEvent, ProgressReporter,
    UrlSource,
};
pub use env::{EnvError, EnvStoreConfig, EnvironmentStore, Scope};
pub use extract::{ArchiveExtractor, ExtractError, ExtractionSummary, ExtractorKind};
