use thiserror::Error;

use crate::{
    actions::CliActionError,
    connector::ConnectError,
    convert::ConvertError,
    credential_file::CredentialFileError,
    exit_codes::AdminExitCode,
    http_utils::ApiError,
    prompt::PromptError,
    resolver::ResolveError,
    secret::SecretError,
    session_context::ContextError,
};

/// Error types that can occur during CLI command execution
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Undefined or unsupported subcommand: {0}")]
    UnsupportedSubcommand(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(#[from] crate::configuration::ConfigurationError),
    #[error("Formatting error: {0}")]
    FormattingError(#[from] crate::format::FormattingError),
    #[error("Security error: {0}")]
    SecurityError(#[from] SecretError),
    #[error("Missing required argument: {0}")]
    MissingRequiredArgument(String),
    #[error(transparent)]
    ContextError(#[from] ContextError),
    #[error(transparent)]
    CredentialFileError(#[from] CredentialFileError),
    #[error(transparent)]
    ResolveError(#[from] ResolveError),
    #[error(transparent)]
    PromptError(#[from] PromptError),
    #[error(transparent)]
    ApiError(#[from] ApiError),
    #[error(transparent)]
    ConvertError(#[from] ConvertError),
    #[error("{0}")]
    ActionError(#[from] CliActionError),
}

impl From<ConnectError> for CliError {
    fn from(error: ConnectError) -> Self {
        match error {
            ConnectError::Context(e) => CliError::ContextError(e),
            ConnectError::Resolve(e) => CliError::ResolveError(e),
            ConnectError::Api(e) => CliError::ApiError(e),
            ConnectError::TokenRequired => {
                CliError::MissingRequiredArgument(crate::commands::params::PARAMETER_TOKEN.to_string())
            }
        }
    }
}

fn api_exit_code(error: &ApiError) -> AdminExitCode {
    if error.is_auth_failure() {
        return AdminExitCode::AuthError;
    }
    if error.is_not_found() {
        return AdminExitCode::NotFound;
    }
    match error {
        ApiError::Transport(e) if e.is_connect() || e.is_timeout() => AdminExitCode::NetworkError,
        ApiError::Transport(e) if e.status().is_none() => AdminExitCode::NetworkError,
        ApiError::Json(_) | ApiError::Xml(_) => AdminExitCode::DataError,
        ApiError::InvalidServer { .. } | ApiError::InvalidHeader(_) | ApiError::InvalidPath(_) => {
            AdminExitCode::UsageError
        }
        ApiError::MissingToken => AdminExitCode::AuthError,
        _ => AdminExitCode::ApiError,
    }
}

impl CliError {
    /// Exit code for this error.
    ///
    /// 401/403 map to `AuthError`, 404 to `NotFound` and other HTTP failures
    /// to `ApiError`.
    pub fn exit_code(&self) -> AdminExitCode {
        match self {
            CliError::UnsupportedSubcommand(_) => AdminExitCode::UsageError,
            CliError::MissingRequiredArgument(_) => AdminExitCode::UsageError,
            CliError::ContextError(_) => AdminExitCode::UsageError,
            CliError::PromptError(_) => AdminExitCode::UsageError,
            CliError::ConfigurationError(_) => AdminExitCode::ConfigError,
            CliError::FormattingError(_) => AdminExitCode::DataError,
            CliError::ConvertError(_) => AdminExitCode::DataError,
            CliError::SecurityError(_) => AdminExitCode::IoError,
            CliError::CredentialFileError(_) => AdminExitCode::IoError,
            CliError::ResolveError(ResolveError::CredentialFile(_)) => AdminExitCode::IoError,
            CliError::ResolveError(ResolveError::Prompt(_)) => AdminExitCode::UsageError,
            CliError::ResolveError(_) => AdminExitCode::AuthError,
            CliError::ApiError(e) => api_exit_code(e),
            CliError::ActionError(e) => e.exit_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn http(status: StatusCode) -> CliError {
        CliError::ApiError(ApiError::Http {
            status,
            message: "x".into(),
        })
    }

    #[test]
    fn test_http_status_classification() {
        assert_eq!(http(StatusCode::UNAUTHORIZED).exit_code(), AdminExitCode::AuthError);
        assert_eq!(http(StatusCode::FORBIDDEN).exit_code(), AdminExitCode::AuthError);
        assert_eq!(http(StatusCode::NOT_FOUND).exit_code(), AdminExitCode::NotFound);
        assert_eq!(
            http(StatusCode::INTERNAL_SERVER_ERROR).exit_code(),
            AdminExitCode::ApiError
        );
    }

    #[test]
    fn test_resolution_failures_are_auth_errors() {
        let error = CliError::from(ConnectError::Resolve(ResolveError::MissingCredential {
            identity: "alice".into(),
            server: " on pvwa".into(),
        }));
        assert_eq!(error.exit_code(), AdminExitCode::AuthError);
    }

    #[test]
    fn test_logoff_without_token_is_usage_error() {
        let error = CliError::from(ConnectError::TokenRequired);
        assert!(matches!(error, CliError::MissingRequiredArgument(ref name) if name == "token"));
        assert_eq!(error.exit_code(), AdminExitCode::UsageError);
    }

    #[test]
    fn test_missing_server_is_usage_error() {
        let error = CliError::from(ConnectError::Context(ContextError::MissingValue {
            namespace: crate::session_context::Namespace::Vault,
            key: "Server".into(),
        }));
        assert_eq!(error.exit_code(), AdminExitCode::UsageError);
    }
}
