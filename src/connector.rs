//! Exchanging a credential for a session token.
//!
//! [`SessionConnector`] runs the same steps for every API family: settle the
//! server and certificate opt-out from the [`SessionContext`], build a client
//! scoped to that server, then either take a supplied token, reuse the token
//! already cached for that server and identity, or resolve a credential and
//! log in. A fresh token replaces whatever the namespace held before. A
//! failed login leaves the context untouched.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use strum::Display;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::credential::{Credential, SessionToken};
use crate::http_utils::{ApiError, HttpClient, HttpRequestConfig};
use crate::resolver::{CredentialResolver, ResolveError, ResolveRequest};
use crate::secret::{Secret, SecretProtector};
use crate::session_context::{
    CacheValue, ContextError, Namespace, SessionContext, KEY_APPROVE_ALL_CERTIFICATES,
    KEY_CREDENTIAL, KEY_CREDENTIAL_DIRECTORY, KEY_SERVER, KEY_USERNAME,
};

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("ending a session needs the token printed by login")]
    TokenRequired,
}

/// The login and logoff calls of one API family.
#[async_trait]
pub trait LoginApi: Send + Sync {
    fn namespace(&self) -> Namespace;

    /// Key under which the family's token is cached.
    fn token_key(&self) -> &'static str;

    /// Family-specific client settings, e.g. a versioned `Accept` header.
    fn configure(&self, config: HttpRequestConfig) -> HttpRequestConfig {
        config
    }

    async fn login(&self, client: &HttpClient, credential: &Credential) -> Result<Secret, ApiError>;

    async fn logoff(&self, client: &HttpClient, token: &SessionToken) -> Result<(), ApiError>;
}

/// How a session's token was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionSource {
    Supplied,
    Cached,
    LoggedIn,
}

/// A client bound to one server plus the token to present to it.
#[derive(Debug, Clone)]
pub struct Session {
    client: HttpClient,
    token: SessionToken,
    source: SessionSource,
}

impl Session {
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub fn source(&self) -> SessionSource {
        self.source
    }
}

/// Connection parameters as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    pub server: Option<String>,
    /// A token from an earlier login, plain or as an envelope.
    pub token: Option<String>,
    pub approve_all_certificates: bool,
    pub identity: Option<String>,
    pub secret: Option<String>,
    pub interactive: bool,
    pub credential_directory: Option<PathBuf>,
}

pub struct SessionConnector<A: LoginApi> {
    api: A,
    resolver: CredentialResolver,
    protector: Arc<dyn SecretProtector>,
    http: HttpRequestConfig,
    credential_directory: PathBuf,
}

impl<A: LoginApi> SessionConnector<A> {
    pub fn new(
        api: A,
        resolver: CredentialResolver,
        protector: Arc<dyn SecretProtector>,
        credential_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            api,
            resolver,
            protector,
            http: HttpRequestConfig::default(),
            credential_directory: credential_directory.into(),
        }
    }

    pub fn with_http_config(mut self, http: HttpRequestConfig) -> Self {
        self.http = http;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn connect(
        &self,
        context: &mut SessionContext,
        options: &ConnectOptions,
    ) -> Result<Session, ConnectError> {
        let namespace = self.api.namespace();
        let server = context.require_text(namespace, KEY_SERVER, options.server.as_deref())?;
        let approve = context.sync_flag(
            namespace,
            KEY_APPROVE_ALL_CERTIFICATES,
            options.approve_all_certificates,
        );

        let config = self
            .api
            .configure(self.http.clone().accept_invalid_certificates(approve));
        let client = HttpClient::new(&server, config)?;

        if let Some(raw) = options.token.as_deref().filter(|t| !t.trim().is_empty()) {
            debug!("Using supplied token for {}", server);
            let token = SessionToken::new(Secret::parse(raw, self.protector.as_ref()), &server);
            return Ok(Session {
                client,
                token,
                source: SessionSource::Supplied,
            });
        }

        if options.secret.is_none() && self.serves_identity(context, options.identity.as_deref()) {
            if let Some(token) = context
                .token(namespace, self.api.token_key())
                .filter(|t| t.server() == server)
            {
                debug!("Reusing cached token for {}", server);
                return Ok(Session {
                    client,
                    token: token.clone(),
                    source: SessionSource::Cached,
                });
            }
        }

        let identity = context.sync_text(namespace, KEY_USERNAME, options.identity.as_deref(), false)?;
        let directory = context
            .sync_path(
                namespace,
                KEY_CREDENTIAL_DIRECTORY,
                options.credential_directory.clone(),
            )
            .unwrap_or_else(|| self.credential_directory.clone());

        let request = ResolveRequest::new(namespace, directory)
            .server(Some(&server))
            .identity(identity.as_deref())
            .secret(options.secret.as_deref())
            .interactive(options.interactive);
        let credential = self.resolver.require(&request, context)?;

        info!("Logging in to {} as {}", server, credential.identity());
        let value = self.api.login(&client, &credential).await?;
        if value.is_empty() {
            return Err(ApiError::MissingToken.into());
        }

        let token = SessionToken::new(value, &server);
        context.set(namespace, self.api.token_key(), CacheValue::Token(token.clone()));
        context.set(
            namespace,
            KEY_USERNAME,
            CacheValue::Text(credential.identity().to_string()),
        );
        context.set(namespace, KEY_CREDENTIAL, CacheValue::Credential(credential));

        Ok(Session {
            client,
            token,
            source: SessionSource::LoggedIn,
        })
    }

    /// Whether the cached session belongs to `requested`; no request matches any.
    fn serves_identity(&self, context: &SessionContext, requested: Option<&str>) -> bool {
        let Some(requested) = requested else {
            return true;
        };
        let namespace = self.api.namespace();
        let cached = context.credential(namespace).map(Credential::identity).or_else(|| {
            context
                .get(namespace, KEY_USERNAME)
                .and_then(CacheValue::as_text)
        });
        cached == Some(requested)
    }

    pub async fn disconnect(&self, session: &Session) -> Result<(), ApiError> {
        info!("Logging off from {}", session.token().server());
        self.api.logoff(session.client(), session.token()).await
    }

    /// Log off the session behind a supplied token. Never logs in first.
    pub async fn end_session(
        &self,
        context: &mut SessionContext,
        options: &ConnectOptions,
    ) -> Result<(), ConnectError> {
        if options.token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(ConnectError::TokenRequired);
        }
        let session = self.connect(context, options).await?;
        self.disconnect(&session).await?;
        Ok(())
    }

    /// Log off sessions this invocation opened; leave supplied and cached ones alone.
    pub async fn release(&self, session: &Session) {
        if session.source() != SessionSource::LoggedIn {
            return;
        }
        if let Err(e) = self.disconnect(session).await {
            warn!("Logoff from {} failed: {}", session.token().server(), e);
        }
    }
}
