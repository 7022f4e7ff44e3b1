use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use keyring::Entry;

use crate::{
    config::CredentialBackend,
    error::{Error, Result},
};

/// Secret storage keyed by (provider, username).
pub trait CredentialStore: Send + Sync {
    fn get(&self, provider: &str, username: &str) -> Result<Option<String>>;
    fn set(&self, provider: &str, username: &str, secret: &str) -> Result<()>;
    /// Deleting a missing entry is not an error.
    fn delete(&self, provider: &str, username: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct KeyringCredentialStore;

impl CredentialStore for KeyringCredentialStore {
    fn get(&self, provider: &str, username: &str) -> Result<Option<String>> {
        let entry = Entry::new(provider, username)?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn set(&self, provider: &str, username: &str, secret: &str) -> Result<()> {
        let entry = Entry::new(provider, username)?;
        entry.set_password(secret).map_err(Error::from)
    }

    fn delete(&self, provider: &str, username: &str) -> Result<()> {
        let entry = Entry::new(provider, username)?;
        match entry.delete_password() {
            Ok(_) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::from(e)),
        }
    }
}

/// Process-local store for development and tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemoryCredentialStore {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<(String, String), String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Credential("credential map poisoned".into()))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, provider: &str, username: &str) -> Result<Option<String>> {
        Ok(self
            .lock()?
            .get(&(provider.to_string(), username.to_string()))
            .cloned())
    }

    fn set(&self, provider: &str, username: &str, secret: &str) -> Result<()> {
        self.lock()?
            .insert((provider.to_string(), username.to_string()), secret.to_string());
        Ok(())
    }

    fn delete(&self, provider: &str, username: &str) -> Result<()> {
        self.lock()?
            .remove(&(provider.to_string(), username.to_string()));
        Ok(())
    }
}

pub fn from_backend(backend: CredentialBackend) -> Arc<dyn CredentialStore> {
    match backend {
        CredentialBackend::Keyring => Arc::new(KeyringCredentialStore),
        CredentialBackend::Memory => Arc::new(MemoryCredentialStore::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_is_keyed_by_provider_and_username() {
        let store = MemoryCredentialStore::default();
        store.set("webull", "alice", "s3cret").unwrap();
        store.set("robinhood", "alice", "other").unwrap();

        assert_eq!(store.get("webull", "alice").unwrap().as_deref(), Some("s3cret"));
        assert_eq!(store.get("robinhood", "alice").unwrap().as_deref(), Some("other"));
        assert_eq!(store.get("fidelity", "alice").unwrap(), None);

        store.delete("webull", "alice").unwrap();
        store.delete("webull", "alice").unwrap();
        assert_eq!(store.get("webull", "alice").unwrap(), None);
    }
}
