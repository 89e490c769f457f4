//! Credentials and session tokens.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;

use crate::secret::Secret;

/// Where a resolved credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum CredentialOrigin {
    Explicit,
    CacheHit,
    DiskFile,
    InteractivePrompt,
}

/// An identity with its secret. Built once per resolution and never mutated.
#[derive(Debug, Clone)]
pub struct Credential {
    identity: String,
    secret: Secret,
    origin: CredentialOrigin,
}

impl Credential {
    pub fn new(identity: impl Into<String>, secret: Secret, origin: CredentialOrigin) -> Self {
        Self {
            identity: identity.into(),
            secret,
            origin,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    pub fn origin(&self) -> CredentialOrigin {
        self.origin
    }

    /// The same identity and secret, re-tagged with a new origin.
    pub fn with_origin(&self, origin: CredentialOrigin) -> Self {
        Self {
            identity: self.identity.clone(),
            secret: self.secret.clone(),
            origin,
        }
    }
}

/// Result of a successful login, reused for later calls in the same session.
///
/// There is no expiry tracking; a stale token shows up as an auth failure on the
/// next call.
#[derive(Debug, Clone)]
pub struct SessionToken {
    value: Secret,
    server: String,
    created_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn new(value: Secret, server: impl Into<String>) -> Self {
        Self {
            value,
            server: server.into(),
            created_at: Utc::now(),
        }
    }

    pub fn value(&self) -> &Secret {
        &self.value
    }

    /// Plain token for use as a header value.
    pub fn expose(&self) -> &str {
        self.value.expose()
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
