use std::path::PathBuf;
use std::str::FromStr;

use clap::ArgMatches;
use tracing::info;

use crate::{
    actions::{required_text, text, CliActionError},
    commands::params::{
        PARAMETER_APPROVE_ALL_CERTIFICATES, PARAMETER_CREDENTIAL_DIR, PARAMETER_NAMESPACE,
        PARAMETER_PRETTY, PARAMETER_SERVER, PARAMETER_USERNAME,
    },
    configuration::Configuration,
    error::CliError,
    format::{Formattable, OutputFormat, OutputFormatOptions},
    session_context::Namespace,
};

pub fn show(configuration: &Configuration, matches: &ArgMatches) -> Result<(), CliError> {
    let format = OutputFormat::Json(OutputFormatOptions {
        with_headers: false,
        pretty: matches.get_flag(PARAMETER_PRETTY),
    });
    println!("{}", configuration.format(&format)?);
    Ok(())
}

pub fn path() -> Result<(), CliError> {
    let path = Configuration::get_default_configuration_file_path()?;
    println!("{}", path.display());
    Ok(())
}

/// Update one namespace's defaults and save the file.
pub fn set(configuration: &mut Configuration, matches: &ArgMatches) -> Result<(), CliError> {
    let name = required_text(matches, PARAMETER_NAMESPACE)?;
    let namespace = Namespace::from_str(&name).map_err(|_| CliActionError::InvalidArgument {
        name: PARAMETER_NAMESPACE.to_string(),
        value: name.clone(),
    })?;

    let defaults = configuration.defaults_mut(namespace)?;
    if let Some(server) = text(matches, PARAMETER_SERVER) {
        defaults.server = Some(server);
    }
    if let Some(username) = text(matches, PARAMETER_USERNAME) {
        defaults.username = Some(username);
    }
    if let Some(approve) = matches.get_one::<bool>(PARAMETER_APPROVE_ALL_CERTIFICATES) {
        defaults.approve_all_certificates = Some(*approve);
    }
    if let Some(directory) = matches.get_one::<PathBuf>(PARAMETER_CREDENTIAL_DIR) {
        defaults.credential_directory = Some(directory.clone());
    }

    configuration.save_to_default()?;
    info!("Updated {} defaults", namespace);
    Ok(())
}
