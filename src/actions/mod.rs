//! Command handlers.
//!
//! Each submodule serves one command group. Shared argument extraction and
//! output helpers live here.

use std::path::PathBuf;
use std::str::FromStr;

use clap::ArgMatches;
use thiserror::Error;

use crate::{
    commands::params::{
        PARAMETER_APPROVE_ALL_CERTIFICATES, PARAMETER_CREDENTIAL_DIR, PARAMETER_FORMAT,
        PARAMETER_HEADERS, PARAMETER_INTERACTIVE, PARAMETER_PASSWORD, PARAMETER_PRETTY,
        PARAMETER_REVEAL, PARAMETER_SERVER, PARAMETER_TOKEN, PARAMETER_USERNAME,
    },
    connector::ConnectOptions,
    error::CliError,
    exit_codes::AdminExitCode,
    format::{Formattable, OutputFormat, OutputFormatOptions},
    secret::{Secret, SecretProtector},
};

pub mod cloud;
pub mod config;
pub mod credentials;
pub mod utils;
pub mod vault;
pub mod vsphere;

#[derive(Debug, Error)]
pub enum CliActionError {
    #[error("{failed} of {total} items failed")]
    PartialFailure { failed: usize, total: usize },

    #[error("Missing required argument: {0}")]
    MissingRequiredArgument(String),

    #[error("invalid value '{value}' for {name}")]
    InvalidArgument { name: String, value: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CliActionError {
    pub fn exit_code(&self) -> AdminExitCode {
        match self {
            CliActionError::PartialFailure { .. } => AdminExitCode::ApiError,
            CliActionError::MissingRequiredArgument(_) | CliActionError::InvalidArgument { .. } => {
                AdminExitCode::UsageError
            }
            CliActionError::IoError(_) => AdminExitCode::IoError,
        }
    }
}

/// `--format`, `--pretty` and `--headers` as an [`OutputFormat`].
pub fn output_format(matches: &ArgMatches) -> Result<OutputFormat, CliError> {
    let options = OutputFormatOptions {
        with_headers: flag(matches, PARAMETER_HEADERS),
        pretty: flag(matches, PARAMETER_PRETTY),
    };
    let name = matches
        .get_one::<String>(PARAMETER_FORMAT)
        .map(String::as_str)
        .unwrap_or(crate::format::JSON);
    Ok(OutputFormat::from_string_with_options(name, options)?)
}

pub fn print_formatted<T: Formattable>(value: &T, format: &OutputFormat) -> Result<(), CliError> {
    println!("{}", value.format(format)?);
    Ok(())
}

/// Connection arguments as [`ConnectOptions`].
pub fn connect_options(matches: &ArgMatches) -> ConnectOptions {
    ConnectOptions {
        server: text(matches, PARAMETER_SERVER),
        token: text(matches, PARAMETER_TOKEN),
        approve_all_certificates: flag(matches, PARAMETER_APPROVE_ALL_CERTIFICATES),
        identity: text(matches, PARAMETER_USERNAME),
        secret: text(matches, PARAMETER_PASSWORD),
        interactive: flag(matches, PARAMETER_INTERACTIVE),
        credential_directory: matches.get_one::<PathBuf>(PARAMETER_CREDENTIAL_DIR).cloned(),
    }
}

/// The envelope, or the plain value with `--reveal`.
pub fn print_secret(
    matches: &ArgMatches,
    secret: &Secret,
    protector: &dyn SecretProtector,
) -> Result<(), CliError> {
    if flag(matches, PARAMETER_REVEAL) {
        println!("{}", secret.expose());
    } else {
        println!("{}", secret.to_envelope(protector)?);
    }
    Ok(())
}

/// Optional string argument; also `None` for arguments the command does not define.
pub fn text(matches: &ArgMatches, name: &str) -> Option<String> {
    matches
        .try_get_one::<String>(name)
        .ok()
        .flatten()
        .cloned()
}

pub fn flag(matches: &ArgMatches, name: &str) -> bool {
    matches
        .try_get_one::<bool>(name)
        .ok()
        .flatten()
        .copied()
        .unwrap_or(false)
}

pub fn required_text(matches: &ArgMatches, name: &str) -> Result<String, CliError> {
    text(matches, name).ok_or_else(|| CliError::MissingRequiredArgument(name.to_string()))
}

pub fn parse_arg<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<T>, CliError> {
    match text(matches, name) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| {
                CliActionError::InvalidArgument {
                    name: name.to_string(),
                    value,
                }
                .into()
            }),
        None => Ok(None),
    }
}
