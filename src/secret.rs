//! Sensitive values and their protected envelope form.
//!
//! Passwords and session tokens travel through the CLI in one of two shapes:
//! plain text, or an opaque envelope that can be printed to a terminal and fed
//! back in later. [`Secret::parse`] settles which shape a raw value has exactly
//! once, where the value enters the program; nothing downstream guesses again.

use base64::{engine::general_purpose, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretBox, SecretString};
use thiserror::Error;
use tracing::{debug, trace};

use crate::keyring::{KeyStore, KeyStoreError};

/// Prefix that marks a string as a protected envelope.
pub const ENVELOPE_PREFIX: &str = "enc:v1:";

/// Name of the key store entry holding the per-user protection key.
pub const PROTECTION_KEY_ENTRY: &str = "data-protection-key";

const KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 12;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("value is not a protected envelope")]
    NotAnEnvelope,
    #[error("envelope is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    #[error("envelope is too short")]
    Truncated,
    #[error("envelope could not be opened with this user's key")]
    DecryptionFailed,
    #[error("failed to seal secret")]
    EncryptionFailed,
    #[error("protected value is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("protection key is malformed")]
    MalformedKey,
    #[error("key store error: {0}")]
    KeyStore(#[from] KeyStoreError),
}

/// Seals and opens secret values with a key that never leaves this user's account.
pub trait SecretProtector: Send + Sync {
    fn protect(&self, plain: &str) -> Result<String, SecretError>;
    fn unprotect(&self, envelope: &str) -> Result<SecretString, SecretError>;
}

/// ChaCha20-Poly1305 envelope: `enc:v1:` followed by base64 of nonce and ciphertext.
pub struct EnvelopeProtector {
    key: SecretBox<[u8; KEY_LENGTH]>,
}

impl EnvelopeProtector {
    pub fn from_key(key: [u8; KEY_LENGTH]) -> Self {
        Self {
            key: SecretBox::new(Box::new(key)),
        }
    }

    /// Load the per-user key from `store`, generating and storing a fresh one on first use.
    pub fn from_key_store(store: &dyn KeyStore) -> Result<Self, SecretError> {
        match store.get(PROTECTION_KEY_ENTRY)? {
            Some(encoded) => {
                trace!("Using existing protection key");
                let bytes = general_purpose::STANDARD.decode(encoded.trim())?;
                let key: [u8; KEY_LENGTH] =
                    bytes.try_into().map_err(|_| SecretError::MalformedKey)?;
                Ok(Self::from_key(key))
            }
            None => {
                debug!("No protection key found, generating a new one");
                let mut key = [0u8; KEY_LENGTH];
                OsRng.fill_bytes(&mut key);
                store.put(PROTECTION_KEY_ENTRY, &general_purpose::STANDARD.encode(key))?;
                Ok(Self::from_key(key))
            }
        }
    }

    fn cipher(&self) -> Result<ChaCha20Poly1305, SecretError> {
        ChaCha20Poly1305::new_from_slice(self.key.expose_secret())
            .map_err(|_| SecretError::MalformedKey)
    }
}

impl SecretProtector for EnvelopeProtector {
    #[allow(deprecated)]
    fn protect(&self, plain: &str) -> Result<String, SecretError> {
        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher()?
            .encrypt(nonce, plain.as_bytes())
            .map_err(|_| SecretError::EncryptionFailed)?;

        let mut sealed = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(format!(
            "{}{}",
            ENVELOPE_PREFIX,
            general_purpose::STANDARD.encode(sealed)
        ))
    }

    #[allow(deprecated)]
    fn unprotect(&self, envelope: &str) -> Result<SecretString, SecretError> {
        let encoded = envelope
            .trim()
            .strip_prefix(ENVELOPE_PREFIX)
            .ok_or(SecretError::NotAnEnvelope)?;
        let sealed = general_purpose::STANDARD.decode(encoded)?;
        if sealed.len() <= NONCE_LENGTH {
            return Err(SecretError::Truncated);
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LENGTH);
        let plain = self
            .cipher()?
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| SecretError::DecryptionFailed)?;

        Ok(SecretString::from(String::from_utf8(plain)?))
    }
}

/// A password or token, tagged with the shape it arrived in.
#[derive(Clone)]
pub enum Secret {
    /// Arrived as an envelope; `plain` is the opened value.
    Encoded { envelope: String, plain: SecretString },
    PlainText(SecretString),
}

impl Secret {
    /// Classify `raw`: open it as an envelope if possible, otherwise take it as plain text.
    pub fn parse(raw: &str, protector: &dyn SecretProtector) -> Secret {
        if !raw.trim_start().starts_with(ENVELOPE_PREFIX) {
            return Secret::PlainText(SecretString::from(raw.to_string()));
        }

        match protector.unprotect(raw) {
            Ok(plain) => Secret::Encoded {
                envelope: raw.trim().to_string(),
                plain,
            },
            Err(e) => {
                debug!("Envelope could not be opened ({}), using value as plain text", e);
                Secret::PlainText(SecretString::from(raw.to_string()))
            }
        }
    }

    pub fn plain(value: impl Into<String>) -> Secret {
        Secret::PlainText(SecretString::from(value.into()))
    }

    /// The usable value, e.g. for an HTTP header.
    pub fn expose(&self) -> &str {
        match self {
            Secret::Encoded { plain, .. } => plain.expose_secret(),
            Secret::PlainText(plain) => plain.expose_secret(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }

    pub fn is_encoded(&self) -> bool {
        matches!(self, Secret::Encoded { .. })
    }

    /// The printable opaque form. Reuses the original envelope when there is one.
    pub fn to_envelope(&self, protector: &dyn SecretProtector) -> Result<String, SecretError> {
        match self {
            Secret::Encoded { envelope, .. } => Ok(envelope.clone()),
            Secret::PlainText(plain) => protector.protect(plain.expose_secret()),
        }
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Secret::Encoded { .. } => write!(f, "Secret::Encoded([REDACTED])"),
            Secret::PlainText(_) => write!(f, "Secret::PlainText([REDACTED])"),
        }
    }
}
