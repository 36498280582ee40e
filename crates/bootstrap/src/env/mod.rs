//! Persistent environment variables
//!
//! [`EnvironmentStore`] is the one interface callers use. The host backend is
//! picked once through [`for_host`]:
//!
//! - Windows: [`RegistryStore`], machine and user environment keys.
//! - Elsewhere: [`FileBackedStore`], the live process environment plus an
//!   append-only file such as `/etc/environment`.
//!
//! [`MemoryStore`] stands in for either in tests.

pub mod error;
pub mod file;
pub mod memory;
pub mod process;
#[cfg(windows)]
pub mod registry;

pub use error::{EnvError, Result};
pub use file::FileBackedStore;
pub use memory::MemoryStore;
pub use process::{MemoryEnvironment, OsEnvironment, ProcessEnvironment};
#[cfg(windows)]
pub use registry::RegistryStore;

use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

/// Name of the executable search path variable
#[cfg(windows)]
pub const PATH_VAR: &str = "Path";
#[cfg(not(windows))]
pub const PATH_VAR: &str = "PATH";

/// Separator between PATH elements
#[cfg(windows)]
pub const PATH_DELIMITER: char = ';';
#[cfg(not(windows))]
pub const PATH_DELIMITER: char = ':';

/// Visibility of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Machine-wide, all users
    System,
    /// Current user only
    User,
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "system" => Ok(Scope::System),
            "user" => Ok(Scope::User),
            other => Err(format!("unknown scope '{}' (expected system or user)", other)),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::System => write!(f, "system"),
            Scope::User => write!(f, "user"),
        }
    }
}

/// Read and write scoped environment variables
pub trait EnvironmentStore: Send + Sync {
    /// Current value of `name`, or `None` when it is not set anywhere
    fn get(&self, scope: Scope, name: &str) -> Result<Option<String>>;

    /// Persist `value` for `name`
    fn set(&self, scope: Scope, name: &str, value: &str) -> Result<()>;

    /// Append `directory` to the system PATH unless it is already an element.
    ///
    /// Returns whether PATH changed. A second call with the same directory
    /// sees the first call's write and returns `false`.
    fn add_to_path(&self, directory: &str) -> Result<bool> {
        let scope = Scope::System;
        let current = self.get(scope, PATH_VAR)?.unwrap_or_default();

        if path_contains(&current, directory) {
            debug!("{} is already on PATH", directory);
            return Ok(false);
        }

        self.set(scope, PATH_VAR, &append_path(&current, directory))?;
        info!("Added {} to {} PATH", directory, scope);
        Ok(true)
    }
}

/// Whether `directory` is one of the elements of `path`
pub fn path_contains(path: &str, directory: &str) -> bool {
    path.split(PATH_DELIMITER).any(|element| {
        if cfg!(windows) {
            element.eq_ignore_ascii_case(directory)
        } else {
            element == directory
        }
    })
}

/// `path` with `directory` appended as a new element
pub fn append_path(path: &str, directory: &str) -> String {
    if path.is_empty() {
        directory.to_string()
    } else {
        format!("{}{}{}", path, PATH_DELIMITER, directory)
    }
}

/// Settings for the host store
#[derive(Debug, Clone)]
pub struct EnvStoreConfig {
    /// Append-only file backing system scope on hosts without a registry
    pub persisted_file: PathBuf,
}

impl Default for EnvStoreConfig {
    fn default() -> Self {
        Self {
            persisted_file: PathBuf::from("/etc/environment"),
        }
    }
}

/// Select the store for this host. Call once at startup.
#[cfg(windows)]
pub fn for_host(_config: &EnvStoreConfig) -> Box<dyn EnvironmentStore> {
    debug!("Using registry environment store");
    Box::new(RegistryStore::new())
}

/// Select the store for this host. Call once at startup.
#[cfg(not(windows))]
pub fn for_host(config: &EnvStoreConfig) -> Box<dyn EnvironmentStore> {
    debug!(
        "Using file-backed environment store at {}",
        config.persisted_file.display()
    );
    Box::new(FileBackedStore::new(OsEnvironment, config.persisted_file.clone()))
}
