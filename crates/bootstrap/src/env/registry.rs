//! Windows registry environment store

use std::io::ErrorKind;

use tracing::debug;
use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_READ, KEY_SET_VALUE, RegType};
use winreg::{RegKey, RegValue};

use super::error::validate;
use super::{EnvError, EnvironmentStore, Result, Scope};

const SYSTEM_KEY: &str = r"SYSTEM\CurrentControlSet\Control\Session Manager\Environment";
const USER_KEY: &str = "Environment";

/// Machine and user environment keys. System scope needs an elevated
/// process to write.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryStore;

impl RegistryStore {
    pub fn new() -> Self {
        Self
    }

    fn location(scope: Scope) -> (RegKey, &'static str) {
        match scope {
            Scope::System => (RegKey::predef(HKEY_LOCAL_MACHINE), SYSTEM_KEY),
            Scope::User => (RegKey::predef(HKEY_CURRENT_USER), USER_KEY),
        }
    }
}

impl EnvironmentStore for RegistryStore {
    fn get(&self, scope: Scope, name: &str) -> Result<Option<String>> {
        let (root, path) = Self::location(scope);
        let registry_error = |e| EnvError::Registry {
            key: path.to_string(),
            name: name.to_string(),
            source: e,
        };

        let key = match root.open_subkey_with_flags(path, KEY_READ) {
            Ok(key) => key,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(registry_error(e)),
        };

        match key.get_value::<String, _>(name) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(registry_error(e)),
        }
    }

    fn set(&self, scope: Scope, name: &str, value: &str) -> Result<()> {
        validate(name, value)?;
        let (root, path) = Self::location(scope);
        let registry_error = |e| EnvError::Registry {
            key: path.to_string(),
            name: name.to_string(),
            source: e,
        };

        let (key, _) = root
            .create_subkey_with_flags(path, KEY_READ | KEY_SET_VALUE)
            .map_err(registry_error)?;

        // Expandable so entries like %SystemRoot% keep working in PATH
        let bytes = value
            .encode_utf16()
            .chain(std::iter::once(0))
            .flat_map(u16::to_le_bytes)
            .collect();
        key.set_raw_value(
            name,
            &RegValue {
                bytes,
                vtype: RegType::REG_EXPAND_SZ,
            },
        )
        .map_err(registry_error)?;

        debug!("Wrote {} to {} registry environment", name, scope);
        Ok(())
    }
}
