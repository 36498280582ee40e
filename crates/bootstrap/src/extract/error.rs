//! Error types for archive extraction

use crate::downloader::FileOperation;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    /// The archive file itself could not be opened or located
    #[error("Failed to open archive '{path}'")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The zip directory or an entry could not be read
    #[error("Archive '{path}' is corrupt or unreadable")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Stream unpacking failed part way through
    #[error("Failed to unpack '{path}'")]
    Unpack {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Declared entry sizes add up past what a `u64` can hold
    #[error("Archive '{path}' declares more uncompressed data than can be represented")]
    SizeOverflow { path: PathBuf },

    /// An entry name points outside the destination directory
    #[error("Archive entry '{name}' escapes the destination directory")]
    UnsafeEntry { name: String },

    #[error("File operation failed on '{path}' while {operation}")]
    FileSystem {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },

    #[error("No archive extraction capability is available on this host")]
    Unsupported,
}

pub type Result<T> = std::result::Result<T, ExtractError>;

impl ExtractError {
    pub(crate) fn file_system(path: impl Into<PathBuf>, operation: FileOperation, source: std::io::Error) -> Self {
        ExtractError::FileSystem {
            path: path.into(),
            operation,
            source,
        }
    }
}
