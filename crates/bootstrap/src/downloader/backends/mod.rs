//! Backend downloader implementations
//!
//! This module contains specific implementations of the FileDownloader trait.
//! Each backend handles a different protocol.
//!
//! Currently supported:
//! - HTTP/HTTPS downloads

pub mod http;

// Re-export main implementations
pub use http::HttpDownloader;
