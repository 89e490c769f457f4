//! Credential resolution as an ordered chain of providers.
//!
//! Each [`CredentialProvider`] either produces a credential or passes. The
//! [`CredentialResolver`] asks them in order and stops at the first hit. The
//! standard chain is: explicit parameters, the session context, the
//! server-scoped credential file, an interactive prompt, and finally the
//! unscoped `{identity}.xml` file (non-interactive only).

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{debug, info};

use crate::credential::{Credential, CredentialOrigin};
use crate::credential_file::{CredentialFileError, CredentialFileStore};
use crate::prompt::{PromptError, Prompter};
use crate::secret::{Secret, SecretProtector};
use crate::session_context::{Namespace, SessionContext};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no credential available for {identity}{server}")]
    MissingCredential { identity: String, server: String },
    #[error("the password entered for {0} is empty")]
    EmptySecret(String),
    #[error(transparent)]
    CredentialFile(#[from] CredentialFileError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// What the caller knows when asking for a credential.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub namespace: Namespace,
    pub server: Option<String>,
    pub identity: Option<String>,
    /// Raw secret as received: plain text or an envelope.
    pub secret: Option<String>,
    pub interactive: bool,
    pub directory: PathBuf,
}

impl ResolveRequest {
    pub fn new(namespace: Namespace, directory: impl Into<PathBuf>) -> Self {
        Self {
            namespace,
            server: None,
            identity: None,
            secret: None,
            interactive: false,
            directory: directory.into(),
        }
    }

    pub fn server(mut self, server: Option<&str>) -> Self {
        self.server = server.map(str::to_string);
        self
    }

    pub fn identity(mut self, identity: Option<&str>) -> Self {
        self.identity = identity.map(str::to_string);
        self
    }

    pub fn secret(mut self, secret: Option<&str>) -> Self {
        self.secret = secret.map(str::to_string);
        self
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    fn identity_ref(&self) -> Option<&str> {
        self.identity.as_deref().filter(|i| !i.is_empty())
    }

    fn store(&self, protector: &Arc<dyn SecretProtector>) -> CredentialFileStore {
        CredentialFileStore::new(&self.directory, Arc::clone(protector))
    }
}

pub trait CredentialProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn try_resolve(
        &self,
        request: &ResolveRequest,
        context: &SessionContext,
    ) -> Result<Option<Credential>, ResolveError>;
}

/// Both identity and secret were passed in.
pub struct ExplicitProvider {
    protector: Arc<dyn SecretProtector>,
}

impl ExplicitProvider {
    pub fn new(protector: Arc<dyn SecretProtector>) -> Self {
        Self { protector }
    }
}

impl CredentialProvider for ExplicitProvider {
    fn name(&self) -> &'static str {
        "explicit"
    }

    fn try_resolve(
        &self,
        request: &ResolveRequest,
        _context: &SessionContext,
    ) -> Result<Option<Credential>, ResolveError> {
        match (request.identity_ref(), request.secret.as_deref()) {
            (Some(identity), Some(raw)) => Ok(Some(Credential::new(
                identity,
                Secret::parse(raw, self.protector.as_ref()),
                CredentialOrigin::Explicit,
            ))),
            _ => Ok(None),
        }
    }
}

/// A credential resolved earlier in the same session.
pub struct CachedProvider;

impl CredentialProvider for CachedProvider {
    fn name(&self) -> &'static str {
        "session"
    }

    fn try_resolve(
        &self,
        request: &ResolveRequest,
        context: &SessionContext,
    ) -> Result<Option<Credential>, ResolveError> {
        let Some(cached) = context.credential(request.namespace) else {
            return Ok(None);
        };
        match request.identity_ref() {
            Some(identity) if identity != cached.identity() => Ok(None),
            _ => Ok(Some(cached.with_origin(CredentialOrigin::CacheHit))),
        }
    }
}

/// `{server}-{identity}.xml` in the credential directory.
pub struct DiskFileProvider {
    protector: Arc<dyn SecretProtector>,
}

impl DiskFileProvider {
    pub fn new(protector: Arc<dyn SecretProtector>) -> Self {
        Self { protector }
    }
}

impl CredentialProvider for DiskFileProvider {
    fn name(&self) -> &'static str {
        "credential file"
    }

    fn try_resolve(
        &self,
        request: &ResolveRequest,
        _context: &SessionContext,
    ) -> Result<Option<Credential>, ResolveError> {
        let (Some(server), Some(identity)) = (request.server.as_deref(), request.identity_ref())
        else {
            return Ok(None);
        };
        Ok(request.store(&self.protector).load(Some(server), identity)?)
    }
}

/// `{identity}.xml`, tried only when nobody is there to answer a prompt.
pub struct IdentityFileProvider {
    protector: Arc<dyn SecretProtector>,
}

impl IdentityFileProvider {
    pub fn new(protector: Arc<dyn SecretProtector>) -> Self {
        Self { protector }
    }
}

impl CredentialProvider for IdentityFileProvider {
    fn name(&self) -> &'static str {
        "identity file"
    }

    fn try_resolve(
        &self,
        request: &ResolveRequest,
        _context: &SessionContext,
    ) -> Result<Option<Credential>, ResolveError> {
        if request.interactive {
            return Ok(None);
        }
        let Some(identity) = request.identity_ref() else {
            return Ok(None);
        };
        Ok(request.store(&self.protector).load(None, identity)?)
    }
}

/// Ask the operator, then offer to save what they typed.
pub struct InteractiveProvider {
    prompter: Arc<dyn Prompter>,
    protector: Arc<dyn SecretProtector>,
    save_by_default: bool,
}

impl InteractiveProvider {
    /// Saving defaults to "no"; see [`InteractiveProvider::save_by_default`].
    pub fn new(prompter: Arc<dyn Prompter>, protector: Arc<dyn SecretProtector>) -> Self {
        Self {
            prompter,
            protector,
            save_by_default: false,
        }
    }

    pub fn save_by_default(mut self, save: bool) -> Self {
        self.save_by_default = save;
        self
    }
}

impl CredentialProvider for InteractiveProvider {
    fn name(&self) -> &'static str {
        "interactive prompt"
    }

    fn try_resolve(
        &self,
        request: &ResolveRequest,
        _context: &SessionContext,
    ) -> Result<Option<Credential>, ResolveError> {
        if !request.interactive {
            return Ok(None);
        }

        let target = request.server.as_deref().unwrap_or("the server");
        let identity = self
            .prompter
            .identity(&format!("User name for {}:", target), request.identity_ref())?;
        let identity = identity.trim().to_string();
        if identity.is_empty() {
            return Ok(None);
        }

        let secret = self
            .prompter
            .secret(&format!("Password for {}:", identity))?;
        if secret.expose_secret().is_empty() {
            return Err(ResolveError::EmptySecret(identity));
        }

        let credential = Credential::new(
            identity,
            Secret::PlainText(secret),
            CredentialOrigin::InteractivePrompt,
        );

        let save = self
            .prompter
            .confirm("Save these credentials for next time?", self.save_by_default)?;
        if save {
            let path = request
                .store(&self.protector)
                .save(request.server.as_deref(), &credential)?;
            info!("Credentials saved to {}", path.display());
        }

        Ok(Some(credential))
    }
}

/// Providers asked in order; the first one to produce a credential wins.
pub struct CredentialResolver {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl CredentialResolver {
    pub fn new(providers: Vec<Box<dyn CredentialProvider>>) -> Self {
        Self { providers }
    }

    /// Explicit, session, server file, prompt, identity file.
    pub fn standard(protector: Arc<dyn SecretProtector>, prompter: Arc<dyn Prompter>) -> Self {
        Self::new(vec![
            Box::new(ExplicitProvider::new(Arc::clone(&protector))),
            Box::new(CachedProvider),
            Box::new(DiskFileProvider::new(Arc::clone(&protector))),
            Box::new(InteractiveProvider::new(prompter, Arc::clone(&protector))),
            Box::new(IdentityFileProvider::new(protector)),
        ])
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    fn first_match(
        &self,
        request: &ResolveRequest,
        context: &SessionContext,
    ) -> Result<Option<Credential>, ResolveError> {
        for provider in &self.providers {
            if let Some(credential) = provider.try_resolve(request, context)? {
                debug!(
                    "Credential for {} resolved by {}",
                    credential.identity(),
                    provider.name()
                );
                return Ok(Some(credential));
            }
        }
        debug!("No credential resolved");
        Ok(None)
    }

    /// Run the chain. With `mandatory`, an empty result is a `MissingCredential` error.
    pub fn resolve(
        &self,
        request: &ResolveRequest,
        context: &SessionContext,
        mandatory: bool,
    ) -> Result<Option<Credential>, ResolveError> {
        match self.first_match(request, context)? {
            Some(credential) => Ok(Some(credential)),
            None if mandatory => Err(missing_credential(request)),
            None => Ok(None),
        }
    }

    pub fn require(
        &self,
        request: &ResolveRequest,
        context: &SessionContext,
    ) -> Result<Credential, ResolveError> {
        self.first_match(request, context)?
            .ok_or_else(|| missing_credential(request))
    }
}

fn missing_credential(request: &ResolveRequest) -> ResolveError {
    ResolveError::MissingCredential {
        identity: request
            .identity
            .clone()
            .unwrap_or_else(|| "<unknown user>".to_string()),
        server: request
            .server
            .as_deref()
            .map(|s| format!(" on {}", s))
            .unwrap_or_default(),
    }
}
