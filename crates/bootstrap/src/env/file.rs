//! Environment store backed by the process environment and an
//! append-only variables file

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::validate;
use super::{EnvError, EnvironmentStore, OsEnvironment, ProcessEnvironment, Result, Scope};
use crate::downloader::FileOperation;

/// System scope reads the live environment first and falls back to the
/// persisted file; writes go to both, the file only ever growing. User scope
/// lives in the process environment alone.
#[derive(Debug)]
pub struct FileBackedStore<E = OsEnvironment> {
    environment: E,
    persisted_file: PathBuf,
}

impl<E: ProcessEnvironment> FileBackedStore<E> {
    pub fn new(environment: E, persisted_file: impl Into<PathBuf>) -> Self {
        Self {
            environment,
            persisted_file: persisted_file.into(),
        }
    }

    pub fn persisted_file(&self) -> &Path {
        &self.persisted_file
    }

    /// Value of the last `NAME=value` line in the persisted file
    fn read_persisted(&self, name: &str) -> Result<Option<String>> {
        let contents = match fs::read_to_string(&self.persisted_file) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(EnvError::PersistedFile {
                    path: self.persisted_file.clone(),
                    operation: FileOperation::Read,
                    source: e,
                });
            }
        };

        let prefix = format!("{}=", name);
        Ok(contents
            .lines()
            .filter_map(|line| line.strip_prefix(&prefix))
            .last()
            .map(|value| value.trim().trim_matches('"').to_string()))
    }

    fn append_persisted(&self, name: &str, value: &str) -> Result<()> {
        let to_error = |e| EnvError::PersistedFile {
            path: self.persisted_file.clone(),
            operation: FileOperation::Write,
            source: e,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.persisted_file)
            .map_err(to_error)?;
        write!(file, "\n{}=\"{}\"\n", name, value).map_err(to_error)?;

        debug!("Appended {} to {}", name, self.persisted_file.display());
        Ok(())
    }
}

impl<E: ProcessEnvironment> EnvironmentStore for FileBackedStore<E> {
    fn get(&self, scope: Scope, name: &str) -> Result<Option<String>> {
        if let Some(value) = self.environment.var(name) {
            return Ok(Some(value));
        }
        match scope {
            Scope::System => self.read_persisted(name),
            Scope::User => Ok(None),
        }
    }

    fn set(&self, scope: Scope, name: &str, value: &str) -> Result<()> {
        validate(name, value)?;
        self.environment.set_var(name, value);
        match scope {
            Scope::System => self.append_persisted(name, value),
            Scope::User => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{MemoryEnvironment, PATH_DELIMITER, PATH_VAR};
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> FileBackedStore<MemoryEnvironment> {
        FileBackedStore::new(MemoryEnvironment::new(), dir.join("environment"))
    }

    #[test]
    fn missing_variable_is_none() {
        let temp_dir = tempdir().unwrap();
        let store = store_in(temp_dir.path());

        assert_eq!(store.get(Scope::System, "SDK_HOME").unwrap(), None);
        assert_eq!(store.get(Scope::User, "SDK_HOME").unwrap(), None);
    }

    #[test]
    fn system_set_appends_quoted_line() {
        let temp_dir = tempdir().unwrap();
        let store = store_in(temp_dir.path());
        fs::write(store.persisted_file(), "LANG=\"en_US.UTF-8\"\n").unwrap();

        store.set(Scope::System, "SDK_HOME", "/opt/sdk").unwrap();

        assert_eq!(
            fs::read_to_string(store.persisted_file()).unwrap(),
            "LANG=\"en_US.UTF-8\"\n\nSDK_HOME=\"/opt/sdk\"\n"
        );
        assert_eq!(store.get(Scope::System, "SDK_HOME").unwrap(), Some("/opt/sdk".to_string()));
    }

    #[test]
    fn later_process_reads_persisted_value() {
        let temp_dir = tempdir().unwrap();
        store_in(temp_dir.path()).set(Scope::System, "SDK_HOME", "/opt/sdk-1").unwrap();
        store_in(temp_dir.path()).set(Scope::System, "SDK_HOME", "/opt/sdk-2").unwrap();

        // Fresh live environment, as in a new process
        let store = store_in(temp_dir.path());

        assert_eq!(store.get(Scope::System, "SDK_HOME").unwrap(), Some("/opt/sdk-2".to_string()));
        let contents = fs::read_to_string(store.persisted_file()).unwrap();
        assert_eq!(contents.matches("SDK_HOME=").count(), 2);
    }

    #[test]
    fn live_environment_wins_over_file() {
        let temp_dir = tempdir().unwrap();
        let file = temp_dir.path().join("environment");
        fs::write(&file, "SDK_HOME=\"/from/file\"\n").unwrap();
        let store = FileBackedStore::new(MemoryEnvironment::with_vars([("SDK_HOME", "/from/env")]), file);

        assert_eq!(store.get(Scope::System, "SDK_HOME").unwrap(), Some("/from/env".to_string()));
    }

    #[test]
    fn prefix_of_another_name_does_not_match() {
        let temp_dir = tempdir().unwrap();
        let store = store_in(temp_dir.path());
        fs::write(store.persisted_file(), "SDK_HOME_OLD=\"/old\"\n").unwrap();

        assert_eq!(store.get(Scope::System, "SDK_HOME").unwrap(), None);
    }

    #[test]
    fn user_scope_never_touches_file() {
        let temp_dir = tempdir().unwrap();
        let store = store_in(temp_dir.path());

        store.set(Scope::User, "EDITOR_THEME", "dark").unwrap();

        assert_eq!(store.get(Scope::User, "EDITOR_THEME").unwrap(), Some("dark".to_string()));
        assert!(!store.persisted_file().exists());
    }

    #[test]
    fn add_to_path_twice_appends_once() {
        let temp_dir = tempdir().unwrap();
        let store = FileBackedStore::new(
            MemoryEnvironment::with_vars([(PATH_VAR, "/usr/bin")]),
            temp_dir.path().join("environment"),
        );

        assert!(store.add_to_path("/opt/sdk/bin").unwrap());
        assert!(!store.add_to_path("/opt/sdk/bin").unwrap());

        let expected = format!("/usr/bin{}/opt/sdk/bin", PATH_DELIMITER);
        assert_eq!(store.get(Scope::System, PATH_VAR).unwrap(), Some(expected.clone()));
        assert_eq!(
            fs::read_to_string(store.persisted_file()).unwrap(),
            format!("\n{}=\"{}\"\n", PATH_VAR, expected)
        );
    }

    #[test]
    fn unwritable_file_is_an_error() {
        let temp_dir = tempdir().unwrap();
        // A directory where the file should be
        let store = FileBackedStore::new(MemoryEnvironment::new(), temp_dir.path());

        let result = store.set(Scope::System, "SDK_HOME", "/opt/sdk");

        assert!(matches!(result, Err(EnvError::PersistedFile { .. })));
    }
}
