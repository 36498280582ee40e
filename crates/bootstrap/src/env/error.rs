//! Error types for the environment store

use crate::downloader::FileOperation;
use std::path::PathBuf;
use thiserror::Error;

/// Failures reading or writing variables.
///
/// A variable that simply does not exist is not an error; lookups return
/// `Ok(None)` for that.
#[derive(Error, Debug)]
pub enum EnvError {
    #[error("Persisted environment file '{path}' could not be accessed while {operation}")]
    PersistedFile {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },

    #[error("Registry key '{key}' could not be accessed for '{name}'")]
    Registry {
        key: String,
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid environment variable name '{name}'")]
    InvalidName { name: String },

    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, EnvError>;

/// Reject names and values the backends cannot store faithfully
pub(crate) fn validate(name: &str, value: &str) -> Result<()> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(EnvError::InvalidName {
            name: name.to_string(),
        });
    }
    if value.contains('\0') {
        return Err(EnvError::InvalidValue {
            name: name.to_string(),
            reason: "contains a NUL character",
        });
    }
    if value.contains('\n') || value.contains('\r') {
        return Err(EnvError::InvalidValue {
            name: name.to_string(),
            reason: "contains a line break",
        });
    }
    Ok(())
}
