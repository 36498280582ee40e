//! Error types for the downloader system with file and URL context

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while fetching a file
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Transport-level failure talking to the server
    #[error("HTTP request to '{url}' failed")]
    HttpRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("Server returned HTTP {status} for '{url}'")]
    HttpStatus {
        url: String,
        status: u16,
    },

    /// File system I/O errors with file context
    #[error("File operation failed on '{path}' while {operation}")]
    FileSystem {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },

    /// URL that cannot be parsed at all
    #[error("Invalid URL '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// No registered backend handles this scheme
    #[error("Unsupported URL scheme in '{url}' (supported: {supported_schemes})")]
    UnsupportedUrl {
        url: String,
        scheme: String,
        supported_schemes: String,
    },

    /// Malformed request, raised before any network activity
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    /// Every mirror was tried and none produced the file
    #[error("Failed to download '{destination}': all {} mirror(s) failed", attempts.len())]
    AllMirrorsFailed {
        destination: PathBuf,
        /// One `url: error` line per mirror, in the order they were tried
        attempts: Vec<String>,
    },
}

/// Types of file operations for error context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Read,
    Write,
    Create,
    Delete,
    CreateDir,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Read => write!(f, "reading"),
            FileOperation::Write => write!(f, "writing"),
            FileOperation::Create => write!(f, "creating"),
            FileOperation::Delete => write!(f, "deleting"),
            FileOperation::CreateDir => write!(f, "creating directory"),
        }
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;

impl DownloadError {
    /// Whether moving on to the next mirror can help.
    ///
    /// Usage errors abort the whole fetch; everything else is tied to one
    /// mirror.
    pub fn is_mirror_failure(&self) -> bool {
        !matches!(
            self,
            DownloadError::Configuration { .. } | DownloadError::AllMirrorsFailed { .. }
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            DownloadError::HttpRequest { .. } => "http_request",
            DownloadError::HttpStatus { .. } => "http_status",
            DownloadError::FileSystem { .. } => "file_system",
            DownloadError::InvalidUrl { .. } => "invalid_url",
            DownloadError::UnsupportedUrl { .. } => "unsupported_url",
            DownloadError::Configuration { .. } => "configuration",
            DownloadError::AllMirrorsFailed { .. } => "all_mirrors_failed",
        }
    }

    /// The error followed by its chain of causes, joined with `: `
    pub fn detailed_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }

    pub(crate) fn file_system(path: impl Into<PathBuf>, operation: FileOperation, source: std::io::Error) -> Self {
        DownloadError::FileSystem {
            path: path.into(),
            operation,
            source,
        }
    }
}
