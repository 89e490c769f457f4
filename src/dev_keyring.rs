use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dirs::config_dir;
use thiserror::Error;

use crate::keyring::{KeyStore, KeyStoreError};

pub const DEV_KEYRING_FILE_NAME: &str = "dev_keys.json";

#[derive(Debug, Error)]
pub enum DevKeyringError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// File-backed key store for machines without a usable OS keyring (CI, containers).
///
/// Values are kept in clear text in the user's config directory. Selected with
/// `key_store: file` in the configuration or the `dev-keyring` feature.
pub struct DevKeyring {
    file_path: PathBuf,
    lock: Mutex<()>,
}

impl Default for DevKeyring {
    fn default() -> DevKeyring {
        // Kept next to the configuration file.
        let mut file_path = match std::env::var(crate::configuration::ENV_CONFIG_DIR) {
            Ok(directory) => PathBuf::from(directory),
            Err(_) => {
                let mut directory = config_dir().unwrap_or_else(|| PathBuf::from("."));
                directory.push(crate::configuration::DEFAULT_APPLICATION_ID);
                directory
            }
        };
        file_path.push(DEV_KEYRING_FILE_NAME);

        DevKeyring::at(file_path)
    }
}

impl DevKeyring {
    pub fn at(file_path: PathBuf) -> Self {
        Self {
            file_path,
            lock: Mutex::new(()),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn load_entries(&self) -> Result<BTreeMap<String, String>, DevKeyringError> {
        if self.file_path.exists() {
            let content = fs::read_to_string(&self.file_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(BTreeMap::new())
        }
    }

    fn save_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), DevKeyringError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.file_path, content)?;
        Ok(())
    }
}

impl KeyStore for DevKeyring {
    fn get(&self, key: &str) -> Result<Option<String>, KeyStoreError> {
        let _guard = self.lock.lock().map_err(|_| KeyStoreError::Unavailable)?;
        Ok(self.load_entries()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), KeyStoreError> {
        let _guard = self.lock.lock().map_err(|_| KeyStoreError::Unavailable)?;
        let mut entries = self.load_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.save_entries(&entries)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KeyStoreError> {
        let _guard = self.lock.lock().map_err(|_| KeyStoreError::Unavailable)?;
        let mut entries = self.load_entries()?;
        if entries.remove(key).is_some() {
            self.save_entries(&entries)?;
        }
        Ok(())
    }
}
