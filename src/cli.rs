//! Command dispatch.

use clap::ArgMatches;
use tracing::debug;

use crate::{
    actions,
    commands::params::{
        COMMAND_ACCOUNT, COMMAND_BASE64, COMMAND_CLOUD, COMMAND_CONFIG, COMMAND_CREDENTIAL,
        COMMAND_DATASTORE, COMMAND_DECODE, COMMAND_ENCODE, COMMAND_FORGET, COMMAND_FROM_EPOCH,
        COMMAND_GET, COMMAND_LIST, COMMAND_LOGIN, COMMAND_LOGOFF, COMMAND_PASSWORD, COMMAND_PATH,
        COMMAND_PROTECT, COMMAND_QUERY, COMMAND_SAVE, COMMAND_SEARCH, COMMAND_SET, COMMAND_SHOW,
        COMMAND_TIME, COMMAND_TO_EPOCH, COMMAND_UTIL, COMMAND_VAULT, COMMAND_VM, COMMAND_VSPHERE,
    },
    configuration::Configuration,
    context::ExecutionContext,
    error::CliError,
};

fn extract_subcommand_name(sub_matches: &ArgMatches) -> String {
    let message = match sub_matches.subcommand() {
        Some(m) => m.0,
        None => "unknown",
    };

    message.to_string()
}

fn unsupported(matches: &ArgMatches) -> CliError {
    CliError::UnsupportedSubcommand(extract_subcommand_name(matches))
}

/// Run the command selected by `matches`.
pub async fn execute_command(matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_UTIL, sub_matches)) => execute_util(sub_matches),
        Some((COMMAND_CONFIG, sub_matches)) => execute_config(sub_matches),
        Some((group, sub_matches)) => {
            debug!("Executing {} command", group);
            let mut ctx = ExecutionContext::load()?;
            match group {
                COMMAND_VAULT => execute_vault(&mut ctx, sub_matches).await,
                COMMAND_CLOUD => execute_cloud(&mut ctx, sub_matches).await,
                COMMAND_VSPHERE => execute_vsphere(&mut ctx, sub_matches).await,
                COMMAND_CREDENTIAL => execute_credential(&mut ctx, sub_matches),
                _ => Err(unsupported(matches)),
            }
        }
        None => Err(unsupported(matches)),
    }
}

async fn execute_vault(ctx: &mut ExecutionContext, matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_LOGIN, sub_matches)) => actions::vault::login(ctx, sub_matches).await,
        Some((COMMAND_LOGOFF, sub_matches)) => actions::vault::logoff(ctx, sub_matches).await,
        Some((COMMAND_ACCOUNT, sub_matches)) => match sub_matches.subcommand() {
            Some((COMMAND_SEARCH, m)) => actions::vault::search_accounts(ctx, m).await,
            Some((COMMAND_GET, m)) => actions::vault::get_accounts(ctx, m).await,
            Some((COMMAND_PASSWORD, m)) => actions::vault::retrieve_password(ctx, m).await,
            _ => Err(unsupported(sub_matches)),
        },
        _ => Err(unsupported(matches)),
    }
}

async fn execute_cloud(ctx: &mut ExecutionContext, matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_LOGIN, sub_matches)) => actions::cloud::login(ctx, sub_matches).await,
        Some((COMMAND_LOGOFF, sub_matches)) => actions::cloud::logoff(ctx, sub_matches).await,
        Some((COMMAND_QUERY, sub_matches)) => actions::cloud::query(ctx, sub_matches).await,
        _ => Err(unsupported(matches)),
    }
}

async fn execute_vsphere(ctx: &mut ExecutionContext, matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_LOGIN, sub_matches)) => actions::vsphere::login(ctx, sub_matches).await,
        Some((COMMAND_LOGOFF, sub_matches)) => actions::vsphere::logoff(ctx, sub_matches).await,
        Some((COMMAND_VM, sub_matches)) => match sub_matches.subcommand() {
            Some((COMMAND_LIST, m)) => actions::vsphere::list_vms(ctx, m).await,
            _ => Err(unsupported(sub_matches)),
        },
        Some((COMMAND_DATASTORE, sub_matches)) => match sub_matches.subcommand() {
            Some((COMMAND_LIST, m)) => actions::vsphere::list_datastores(ctx, m).await,
            _ => Err(unsupported(sub_matches)),
        },
        _ => Err(unsupported(matches)),
    }
}

fn execute_credential(ctx: &mut ExecutionContext, matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_SAVE, sub_matches)) => actions::credentials::save(ctx, sub_matches),
        Some((COMMAND_LIST, sub_matches)) => actions::credentials::list(ctx, sub_matches),
        Some((COMMAND_FORGET, sub_matches)) => actions::credentials::forget(ctx, sub_matches),
        Some((COMMAND_PROTECT, sub_matches)) => actions::credentials::protect(ctx, sub_matches),
        _ => Err(unsupported(matches)),
    }
}

fn execute_util(matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_BASE64, sub_matches)) => match sub_matches.subcommand() {
            Some((COMMAND_ENCODE, m)) => actions::utils::base64_encode(m),
            Some((COMMAND_DECODE, m)) => actions::utils::base64_decode(m),
            _ => Err(unsupported(sub_matches)),
        },
        Some((COMMAND_TIME, sub_matches)) => match sub_matches.subcommand() {
            Some((COMMAND_TO_EPOCH, m)) => actions::utils::to_epoch(m),
            Some((COMMAND_FROM_EPOCH, m)) => actions::utils::from_epoch(m),
            _ => Err(unsupported(sub_matches)),
        },
        _ => Err(unsupported(matches)),
    }
}

fn execute_config(matches: &ArgMatches) -> Result<(), CliError> {
    match matches.subcommand() {
        Some((COMMAND_PATH, _)) => actions::config::path(),
        Some((COMMAND_SHOW, sub_matches)) => {
            let configuration = Configuration::load_or_create_default()?;
            actions::config::show(&configuration, sub_matches)
        }
        Some((COMMAND_SET, sub_matches)) => {
            let mut configuration = Configuration::load_or_create_default()?;
            actions::config::set(&mut configuration, sub_matches)
        }
        _ => Err(unsupported(matches)),
    }
}
