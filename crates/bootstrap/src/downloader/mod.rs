//! Downloader module
//!
//! This module contains the download functionality: core types,
//! configuration, backends, and the mirror-aware entry point.

pub mod backends;
pub mod config;
pub mod core;
pub mod r#lib;
pub mod registry;

// Re-export main types for convenience
pub use r#lib::Downloader;
pub use config::DownloadConfig;
pub use self::core::{
    ConsoleProgressReporter, DownloadError, DownloadResult, FileOperation, IntoProgressCallback,
    NullProgressReporter, ProgressCallback, ProgressEvent, ProgressReporter, ProgressState, Result,
    UrlSource,
};
pub use registry::{DownloaderRegistry, FileDownloader};
