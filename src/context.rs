//! Per-invocation execution context.
//!
//! Wires together what most commands need: the loaded configuration, the
//! session context seeded from it, the secret protector backed by the
//! configured key store, and the interactive prompter.

use std::sync::Arc;

use tracing::debug;

use crate::{
    configuration::{Configuration, KeyStoreKind},
    connector::{LoginApi, SessionConnector},
    credential_file::CredentialFileStore,
    dev_keyring::DevKeyring,
    error::CliError,
    http_utils::HttpRequestConfig,
    keyring::{KeyStore, Keyring},
    prompt::{InquirePrompter, Prompter},
    resolver::CredentialResolver,
    secret::{EnvelopeProtector, SecretError, SecretProtector},
    session_context::{Namespace, SessionContext},
};

pub struct ExecutionContext {
    configuration: Configuration,
    session: SessionContext,
    protector: Arc<dyn SecretProtector>,
    prompter: Arc<dyn Prompter>,
}

impl ExecutionContext {
    /// Load the default configuration and open the configured key store.
    pub fn load() -> Result<Self, CliError> {
        let configuration = Configuration::load_or_create_default()?;
        let protector = Arc::new(protector_for(&configuration)?);
        Ok(Self::new(configuration, protector, Arc::new(InquirePrompter)))
    }

    pub fn new(
        configuration: Configuration,
        protector: Arc<dyn SecretProtector>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        let session = SessionContext::with_configuration(&configuration);
        Self {
            configuration,
            session,
            protector,
            prompter,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn session(&mut self) -> &mut SessionContext {
        &mut self.session
    }

    pub fn protector(&self) -> Arc<dyn SecretProtector> {
        Arc::clone(&self.protector)
    }

    pub fn prompter(&self) -> Arc<dyn Prompter> {
        Arc::clone(&self.prompter)
    }

    pub fn credential_store(
        &self,
        namespace: Namespace,
        directory: Option<&std::path::Path>,
    ) -> Result<CredentialFileStore, CliError> {
        let directory = match directory {
            Some(directory) => directory.to_path_buf(),
            None => self.configuration.credential_directory(namespace)?,
        };
        Ok(CredentialFileStore::new(directory, self.protector()))
    }

    /// A connector for one API family using the standard resolution chain.
    pub fn connector<A: LoginApi>(&self, api: A) -> Result<SessionConnector<A>, CliError> {
        let directory = self.configuration.credential_directory(api.namespace())?;
        let resolver = CredentialResolver::standard(self.protector(), self.prompter());
        Ok(SessionConnector::new(api, resolver, self.protector(), directory)
            .with_http_config(HttpRequestConfig::from_configuration(&self.configuration)))
    }
}

/// The envelope protector keyed from the configured key store.
pub fn protector_for(configuration: &Configuration) -> Result<EnvelopeProtector, SecretError> {
    let store: Box<dyn KeyStore> = match configuration.key_store() {
        KeyStoreKind::Os => Box::new(Keyring::default()),
        KeyStoreKind::File => {
            let keyring = DevKeyring::default();
            debug!("Using file key store at {}", keyring.file_path().display());
            Box::new(keyring)
        }
    };
    EnvelopeProtector::from_key_store(store.as_ref())
}
