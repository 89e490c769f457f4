use keyring::Entry;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use tracing::trace;

pub const KEYRING_SERVICE: &str = "adminctl";

#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("keyring error: {0}")]
    KeyringAccessError(#[from] keyring::Error),
    #[error("key file error: {0}")]
    FileError(#[from] crate::dev_keyring::DevKeyringError),
    #[error("key store is unavailable")]
    Unavailable,
}

/// Per-user storage for small secret values such as the protection key.
pub trait KeyStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, KeyStoreError>;
    fn put(&self, key: &str, value: &str) -> Result<(), KeyStoreError>;
    fn delete(&self, key: &str) -> Result<(), KeyStoreError>;
}

/// The operating system's credential store (Keychain, Secret Service, Credential Manager).
pub struct Keyring {
    service: String,
}

impl Default for Keyring {
    fn default() -> Keyring {
        Keyring {
            service: KEYRING_SERVICE.to_string(),
        }
    }
}

impl Keyring {
    pub fn with_service(service: &str) -> Keyring {
        Keyring {
            service: service.to_string(),
        }
    }
}

impl KeyStore for Keyring {
    fn get(&self, key: &str) -> Result<Option<String>, KeyStoreError> {
        trace!("Reading keyring entry {}:{}", &self.service, key);
        let entry = Entry::new(&self.service, key)?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(KeyStoreError::from(e)),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), KeyStoreError> {
        let entry = Entry::new(&self.service, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KeyStoreError> {
        let entry = Entry::new(&self.service, key)?;
        match entry.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeyStoreError::from(e)),
        }
    }
}

/// Process-local store. Nothing survives the process.
#[derive(Default)]
pub struct MemoryKeyStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KeyStore for MemoryKeyStore {
    fn get(&self, key: &str) -> Result<Option<String>, KeyStoreError> {
        let entries = self.entries.lock().map_err(|_| KeyStoreError::Unavailable)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), KeyStoreError> {
        let mut entries = self.entries.lock().map_err(|_| KeyStoreError::Unavailable)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KeyStoreError> {
        let mut entries = self.entries.lock().map_err(|_| KeyStoreError::Unavailable)?;
        entries.remove(key);
        Ok(())
    }
}
