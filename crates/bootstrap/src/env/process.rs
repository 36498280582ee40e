//! The live environment of the running process

use std::collections::HashMap;
use std::sync::Mutex;

/// Access to the current process's variables
pub trait ProcessEnvironment: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
    fn set_var(&self, name: &str, value: &str);
}

/// The real process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEnvironment;

impl ProcessEnvironment for OsEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn set_var(&self, name: &str, value: &str) {
        // SAFETY: the bootstrapper runs its steps sequentially on one control
        // thread and only touches the environment between network transfers.
        unsafe { std::env::set_var(name, value) }
    }
}

/// Process environment kept in memory, for tests
#[derive(Debug, Default)]
pub struct MemoryEnvironment {
    vars: Mutex<HashMap<String, String>>,
}

impl MemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: Mutex::new(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }
}

impl ProcessEnvironment for MemoryEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }

    fn set_var(&self, name: &str, value: &str) {
        self.vars
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_string(), value.to_string());
    }
}
