//! Secret storage keyed by name.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::error::KeyringError;

/// A small secret store: one string value per key.
///
/// Implementations must be safe to share between threads; callers do not
/// coordinate concurrent writers.
pub trait Keyring: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), KeyringError>;

    /// Removes the value stored under `key`.
    fn del(&self, key: &str) -> Result<(), KeyringError>;

    /// Returns true if a value is stored under `key`.
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

// ---------------------------------------------------------------------------
// OS credential store
// ---------------------------------------------------------------------------

/// Keyring backed by the platform credential store.
///
/// Entries are namespaced by `service`; the client uses the server endpoint
/// so each server keeps its own token.
#[derive(Debug, Clone)]
pub struct SystemKeyring {
    service: String,
}

impl SystemKeyring {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> Result<::keyring::Entry, ::keyring::Error> {
        ::keyring::Entry::new(&self.service, key)
    }
}

impl Keyring for SystemKeyring {
    fn get(&self, key: &str) -> Option<String> {
        match self.entry(key).and_then(|entry| entry.get_password()) {
            Ok(value) => Some(value),
            Err(::keyring::Error::NoEntry) => None,
            Err(e) => {
                debug!(service = %self.service, key, error = %e, "keyring lookup failed");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyringError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn del(&self, key: &str) -> Result<(), KeyringError> {
        self.entry(key)?.delete_credential()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Keyring that lives in process memory.
#[derive(Debug, Default)]
pub struct MemoryKeyring {
    store: Mutex<HashMap<String, String>>,
}

impl MemoryKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Keyring for MemoryKeyring {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyringError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn del(&self, key: &str) -> Result<(), KeyringError> {
        self.lock().remove(key);
        Ok(())
    }
}
