//! Namespaced key-value state for one invocation.
//!
//! A [`SessionContext`] is created by the caller and passed explicitly to every
//! component that needs shared values (server name, certificate opt-out, the
//! session token). Namespaces keep the API families apart, so `Server` in the
//! vault namespace never leaks into the cloud namespace. Entries are created on
//! first write, overwritten by later writes and dropped with the context.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;
use tracing::trace;

use crate::configuration::{Configuration, NamespaceDefaults};
use crate::credential::{Credential, SessionToken};

pub const KEY_SERVER: &str = "Server";
pub const KEY_APPROVE_ALL_CERTIFICATES: &str = "ApproveAllCertificates";
pub const KEY_USERNAME: &str = "UserName";
pub const KEY_CREDENTIAL_DIRECTORY: &str = "CredentialDirectory";
pub const KEY_CREDENTIAL: &str = "Credential";
pub const KEY_AUTHORIZATION_TOKEN: &str = "AuthorizationToken";
pub const KEY_SESSION_TOKEN: &str = "SessionToken";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Namespace {
    Vault,
    Cloud,
    VSphere,
    Utils,
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("no value for {key} in {namespace}; pass it explicitly or set it in the configuration")]
    MissingValue { namespace: Namespace, key: String },
}

#[derive(Debug, Clone)]
pub enum CacheValue {
    Text(String),
    Flag(bool),
    Path(PathBuf),
    Token(SessionToken),
    Credential(Credential),
}

impl CacheValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CacheValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            CacheValue::Flag(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&PathBuf> {
        match self {
            CacheValue::Path(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_token(&self) -> Option<&SessionToken> {
        match self {
            CacheValue::Token(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_credential(&self) -> Option<&Credential> {
        match self {
            CacheValue::Credential(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionContext {
    stores: HashMap<Namespace, HashMap<String, CacheValue>>,
    defaults: HashMap<Namespace, NamespaceDefaults>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that falls back to the configuration's per-namespace values.
    pub fn with_configuration(configuration: &Configuration) -> Self {
        let mut defaults = HashMap::new();
        for namespace in [Namespace::Vault, Namespace::Cloud, Namespace::VSphere] {
            if let Some(section) = configuration.defaults(namespace) {
                defaults.insert(namespace, section.clone());
            }
        }
        Self {
            stores: HashMap::new(),
            defaults,
        }
    }

    pub fn get(&self, namespace: Namespace, key: &str) -> Option<&CacheValue> {
        self.stores.get(&namespace).and_then(|store| store.get(key))
    }

    pub fn set(&mut self, namespace: Namespace, key: &str, value: CacheValue) {
        trace!("Caching {} in {}", key, namespace);
        self.stores
            .entry(namespace)
            .or_default()
            .insert(key.to_string(), value);
    }

    fn default_value(&self, namespace: Namespace, key: &str) -> Option<CacheValue> {
        let defaults = self.defaults.get(&namespace)?;
        match key {
            KEY_SERVER => defaults.server.clone().map(CacheValue::Text),
            KEY_USERNAME => defaults.username.clone().map(CacheValue::Text),
            KEY_APPROVE_ALL_CERTIFICATES => defaults.approve_all_certificates.map(CacheValue::Flag),
            KEY_CREDENTIAL_DIRECTORY => defaults.credential_directory.clone().map(CacheValue::Path),
            _ => None,
        }
    }

    /// Resolve a text value: explicit (stored for later calls), then cached, then configured.
    pub fn sync_text(
        &mut self,
        namespace: Namespace,
        key: &str,
        explicit: Option<&str>,
        mandatory: bool,
    ) -> Result<Option<String>, ContextError> {
        if let Some(value) = explicit.filter(|v| !v.is_empty()) {
            self.set(namespace, key, CacheValue::Text(value.to_string()));
            return Ok(Some(value.to_string()));
        }

        let found = self
            .get(namespace, key)
            .and_then(|v| v.as_text().map(str::to_string))
            .or_else(|| {
                self.default_value(namespace, key)
                    .and_then(|v| v.as_text().map(str::to_string))
            });

        match found {
            Some(value) => Ok(Some(value)),
            None if mandatory => Err(ContextError::MissingValue {
                namespace,
                key: key.to_string(),
            }),
            None => Ok(None),
        }
    }

    /// Like [`SessionContext::sync_text`] for values that must exist.
    pub fn require_text(
        &mut self,
        namespace: Namespace,
        key: &str,
        explicit: Option<&str>,
    ) -> Result<String, ContextError> {
        self.sync_text(namespace, key, explicit, true)?
            .ok_or_else(|| ContextError::MissingValue {
                namespace,
                key: key.to_string(),
            })
    }

    /// Resolve a switch. Once set it stays set for the rest of the session.
    pub fn sync_flag(&mut self, namespace: Namespace, key: &str, explicit: bool) -> bool {
        if explicit {
            self.set(namespace, key, CacheValue::Flag(true));
            return true;
        }

        self.get(namespace, key)
            .and_then(CacheValue::as_flag)
            .or_else(|| self.default_value(namespace, key).and_then(|v| v.as_flag()))
            .unwrap_or(false)
    }

    pub fn sync_path(
        &mut self,
        namespace: Namespace,
        key: &str,
        explicit: Option<PathBuf>,
    ) -> Option<PathBuf> {
        if let Some(path) = explicit {
            self.set(namespace, key, CacheValue::Path(path.clone()));
            return Some(path);
        }

        self.get(namespace, key)
            .and_then(|v| v.as_path().cloned())
            .or_else(|| {
                self.default_value(namespace, key)
                    .and_then(|v| v.as_path().cloned())
            })
    }

    pub fn token(&self, namespace: Namespace, key: &str) -> Option<&SessionToken> {
        self.get(namespace, key).and_then(CacheValue::as_token)
    }

    pub fn credential(&self, namespace: Namespace) -> Option<&Credential> {
        self.get(namespace, KEY_CREDENTIAL)
            .and_then(CacheValue::as_credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::Secret;
    use std::str::FromStr;

    #[test]
    fn test_get_uninitialized_namespace() {
        let context = SessionContext::new();
        assert!(context.get(Namespace::Vault, KEY_SERVER).is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let mut context = SessionContext::new();
        context.set(Namespace::Vault, KEY_SERVER, CacheValue::Text("a".into()));
        context.set(Namespace::Vault, KEY_SERVER, CacheValue::Text("b".into()));
        assert_eq!(
            context.get(Namespace::Vault, KEY_SERVER).and_then(|v| v.as_text()),
            Some("b")
        );
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let mut context = SessionContext::new();
        context.set(Namespace::Vault, KEY_SERVER, CacheValue::Text("pvwa".into()));
        assert!(context.get(Namespace::Cloud, KEY_SERVER).is_none());
    }

    #[test]
    fn test_sync_text_remembers_explicit_value() {
        let mut context = SessionContext::new();
        let first = context
            .sync_text(Namespace::Cloud, KEY_SERVER, Some("vcd.lab"), true)
            .unwrap();
        let second = context.sync_text(Namespace::Cloud, KEY_SERVER, None, true).unwrap();
        assert_eq!(first.as_deref(), Some("vcd.lab"));
        assert_eq!(second.as_deref(), Some("vcd.lab"));
    }

    #[test]
    fn test_sync_text_mandatory_missing() {
        let mut context = SessionContext::new();
        let result = context.sync_text(Namespace::VSphere, KEY_SERVER, None, true);
        assert!(matches!(
            result,
            Err(ContextError::MissingValue { namespace: Namespace::VSphere, .. })
        ));
        assert_eq!(
            context.sync_text(Namespace::VSphere, KEY_SERVER, None, false).unwrap(),
            None
        );
    }

    #[test]
    fn test_sync_text_falls_back_to_configuration() {
        let mut configuration = Configuration::default();
        configuration.defaults_mut(Namespace::Vault).unwrap().server =
            Some("configured".to_string());
        let mut context = SessionContext::with_configuration(&configuration);

        assert_eq!(
            context.sync_text(Namespace::Vault, KEY_SERVER, None, true).unwrap().as_deref(),
            Some("configured")
        );
        context.sync_text(Namespace::Vault, KEY_SERVER, Some("explicit"), true).unwrap();
        assert_eq!(
            context.sync_text(Namespace::Vault, KEY_SERVER, None, true).unwrap().as_deref(),
            Some("explicit")
        );
    }

    #[test]
    fn test_sync_flag_is_sticky() {
        let mut context = SessionContext::new();
        assert!(!context.sync_flag(Namespace::Vault, KEY_APPROVE_ALL_CERTIFICATES, false));
        assert!(context.sync_flag(Namespace::Vault, KEY_APPROVE_ALL_CERTIFICATES, true));
        assert!(context.sync_flag(Namespace::Vault, KEY_APPROVE_ALL_CERTIFICATES, false));
        assert!(!context.sync_flag(Namespace::Cloud, KEY_APPROVE_ALL_CERTIFICATES, false));
    }

    #[test]
    fn test_token_lookup() {
        let mut context = SessionContext::new();
        let token = SessionToken::new(Secret::plain("t"), "pvwa");
        context.set(Namespace::Vault, KEY_AUTHORIZATION_TOKEN, CacheValue::Token(token));
        assert_eq!(
            context.token(Namespace::Vault, KEY_AUTHORIZATION_TOKEN).map(|t| t.expose()),
            Some("t")
        );
        assert!(context.token(Namespace::Vault, KEY_SESSION_TOKEN).is_none());
    }

    #[test]
    fn test_namespace_parse() {
        assert_eq!(Namespace::from_str("vsphere").unwrap(), Namespace::VSphere);
        assert_eq!(Namespace::from_str("Vault").unwrap(), Namespace::Vault);
        assert!(Namespace::from_str("nope").is_err());
    }
}
