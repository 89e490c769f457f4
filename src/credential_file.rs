//! Encrypted credential files on local disk.
//!
//! A file holds one identity and its password sealed with the user's
//! protection key, so it is only readable by the same user on the same machine.
//! Files are named `{server}-{identity}.xml`, or `{identity}.xml` when the
//! credential is not scoped to a server.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::credential::{Credential, CredentialOrigin};
use crate::secret::{Secret, SecretError, SecretProtector};

pub const CREDENTIAL_FILE_EXTENSION: &str = "xml";
const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CredentialFileError {
    #[error("credential file {path} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("credential file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: quick_xml::DeError,
    },
    #[error("credential file {path} has an unsupported version {version}")]
    UnsupportedVersion { path: PathBuf, version: u32 },
    #[error("credential file {path} could not be decrypted: {source}")]
    Decryption {
        path: PathBuf,
        #[source]
        source: SecretError,
    },
    #[error("failed to encrypt credential: {0}")]
    Encryption(#[source] SecretError),
    #[error("failed to serialize credential: {0}")]
    Serialization(#[from] quick_xml::DeError),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "Credential")]
struct CredentialDocument {
    #[serde(rename = "@version")]
    version: u32,
    #[serde(rename = "Server", default, skip_serializing_if = "Option::is_none")]
    server: Option<String>,
    #[serde(rename = "UserName")]
    identity: String,
    #[serde(rename = "Password")]
    password: String,
    #[serde(rename = "CreatedAt")]
    created_at: DateTime<Utc>,
}

/// A directory of credential files.
pub struct CredentialFileStore {
    directory: PathBuf,
    protector: Arc<dyn SecretProtector>,
}

impl CredentialFileStore {
    pub fn new(directory: impl Into<PathBuf>, protector: Arc<dyn SecretProtector>) -> Self {
        Self {
            directory: directory.into(),
            protector,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File path for an identity, optionally scoped to a server.
    pub fn path_for(&self, server: Option<&str>, identity: &str) -> PathBuf {
        let stem = match server {
            Some(server) => format!("{}-{}", sanitize(server), sanitize(identity)),
            None => sanitize(identity),
        };
        self.directory
            .join(format!("{}.{}", stem, CREDENTIAL_FILE_EXTENSION))
    }

    /// Read the credential stored for `server`/`identity`. A missing file is `Ok(None)`.
    pub fn load(
        &self,
        server: Option<&str>,
        identity: &str,
    ) -> Result<Option<Credential>, CredentialFileError> {
        self.load_path(&self.path_for(server, identity))
    }

    pub fn load_path(&self, path: &Path) -> Result<Option<Credential>, CredentialFileError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!("No credential file at {}", path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(CredentialFileError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let document: CredentialDocument =
            quick_xml::de::from_str(&content).map_err(|source| CredentialFileError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        if document.version != DOCUMENT_VERSION {
            return Err(CredentialFileError::UnsupportedVersion {
                path: path.to_path_buf(),
                version: document.version,
            });
        }

        let plain = self
            .protector
            .unprotect(&document.password)
            .map_err(|source| CredentialFileError::Decryption {
                path: path.to_path_buf(),
                source,
            })?;

        debug!("Loaded credential for {} from {}", document.identity, path.display());
        Ok(Some(Credential::new(
            document.identity,
            Secret::Encoded {
                envelope: document.password,
                plain,
            },
            CredentialOrigin::DiskFile,
        )))
    }

    /// Write `credential`, replacing any existing file. Returns the file path.
    pub fn save(
        &self,
        server: Option<&str>,
        credential: &Credential,
    ) -> Result<PathBuf, CredentialFileError> {
        let path = self.path_for(server, credential.identity());
        let password = credential
            .secret()
            .to_envelope(self.protector.as_ref())
            .map_err(CredentialFileError::Encryption)?;

        let document = CredentialDocument {
            version: DOCUMENT_VERSION,
            server: server.map(str::to_string),
            identity: credential.identity().to_string(),
            password,
            created_at: Utc::now(),
        };
        let xml = quick_xml::se::to_string(&document)?;

        let io_error = |source| CredentialFileError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.directory).map_err(io_error)?;
        let mut file = tempfile::NamedTempFile::new_in(&self.directory).map_err(io_error)?;
        file.write_all(xml.as_bytes()).map_err(io_error)?;
        file.persist(&path).map_err(|e| io_error(e.error))?;

        debug!("Saved credential for {} to {}", credential.identity(), path.display());
        Ok(path)
    }

    /// Delete a credential file. Returns whether a file was removed.
    pub fn remove(&self, server: Option<&str>, identity: &str) -> Result<bool, CredentialFileError> {
        let path = self.path_for(server, identity);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CredentialFileError::Io { path, source }),
        }
    }

    /// All credential files in the directory, sorted by name.
    pub fn list(&self) -> Result<Vec<PathBuf>, CredentialFileError> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(CredentialFileError::Io {
                    path: self.directory.clone(),
                    source,
                })
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CredentialFileError::Io {
                path: self.directory.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(CREDENTIAL_FILE_EXTENSION) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::EnvelopeProtector;
    use tempfile::tempdir;

    fn store(dir: &Path) -> CredentialFileStore {
        CredentialFileStore::new(dir, Arc::new(EnvelopeProtector::from_key([3u8; 32])))
    }

    #[test]
    fn test_path_convention() {
        let store = store(Path::new("/creds"));
        assert_eq!(
            store.path_for(Some("pvwa.example.com"), "alice"),
            PathBuf::from("/creds/pvwa.example.com-alice.xml")
        );
        assert_eq!(store.path_for(None, "alice"), PathBuf::from("/creds/alice.xml"));
        assert_eq!(
            store.path_for(Some("10.0.0.1:8443"), "CORP\\bob"),
            PathBuf::from("/creds/10.0.0.1_8443-CORP_bob.xml")
        );
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let credential = Credential::new("alice", Secret::plain("p@ss"), CredentialOrigin::InteractivePrompt);

        let path = store.save(Some("pvwa"), &credential).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("<UserName>alice</UserName>"));
        assert!(!content.contains("p@ss"));

        let loaded = store.load(Some("pvwa"), "alice").unwrap().unwrap();
        assert_eq!(loaded.identity(), "alice");
        assert_eq!(loaded.secret().expose(), "p@ss");
        assert_eq!(loaded.origin(), CredentialOrigin::DiskFile);
    }

    #[test]
    fn test_serializer_errors_convert() {
        let error: CredentialFileError = quick_xml::DeError::Custom("bad field".into()).into();
        assert!(matches!(error, CredentialFileError::Serialization(_)));
        assert!(error.to_string().contains("bad field"));
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempdir().unwrap();
        assert!(store(dir.path()).load(Some("pvwa"), "nobody").unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        fs::write(
            store.path_for(Some("pvwa"), "alice"),
            r#"<Credential version="1"><UserName>alice</UserName></Credential>"#,
        )
        .unwrap();
        assert!(matches!(
            store.load(Some("pvwa"), "alice"),
            Err(CredentialFileError::Malformed { .. })
        ));
    }

    #[test]
    fn test_load_with_other_key_is_decryption_error() {
        let dir = tempdir().unwrap();
        let credential = Credential::new("alice", Secret::plain("p@ss"), CredentialOrigin::Explicit);
        store(dir.path()).save(None, &credential).unwrap();

        let other = CredentialFileStore::new(
            dir.path(),
            Arc::new(EnvelopeProtector::from_key([9u8; 32])),
        );
        assert!(matches!(
            other.load(None, "alice"),
            Err(CredentialFileError::Decryption { .. })
        ));
    }

    #[test]
    fn test_list_and_remove() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let credential = Credential::new("alice", Secret::plain("x"), CredentialOrigin::Explicit);
        store.save(Some("b-server"), &credential).unwrap();
        store.save(Some("a-server"), &credential).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = store.list().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a-server-alice.xml"));

        assert!(store.remove(Some("a-server"), "alice").unwrap());
        assert!(!store.remove(Some("a-server"), "alice").unwrap());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_list_missing_directory() {
        let dir = tempdir().unwrap();
        assert!(store(&dir.path().join("absent")).list().unwrap().is_empty());
    }
}
