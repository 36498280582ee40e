//! In-memory environment store for tests and dry runs

use std::collections::HashMap;
use std::sync::Mutex;

use super::error::validate;
use super::{EnvironmentStore, Result, Scope};

/// In-memory store with separate system and user tables
#[derive(Debug, Default)]
pub struct MemoryStore {
    vars: Mutex<HashMap<(Scope, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EnvironmentStore for MemoryStore {
    fn get(&self, scope: Scope, name: &str) -> Result<Option<String>> {
        let vars = self.vars.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(vars.get(&(scope, name.to_string())).cloned())
    }

    fn set(&self, scope: Scope, name: &str, value: &str) -> Result<()> {
        validate(name, value)?;
        self.vars
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert((scope, name.to_string()), value.to_string());
        Ok(())
    }
}
