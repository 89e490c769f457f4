//! CLI command definitions and argument parsing.
//!
//! One submodule per command group; each returns a clap `Command`.

use clap::{ArgMatches, Command};

pub mod cloud;
pub mod config;
pub mod credential;
pub mod params;
pub mod util;
pub mod vault;
pub mod vsphere;

pub use params::*;

/// The full command tree.
pub fn cli_command() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .propagate_version(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(params::verbose_parameter())
        .subcommand(vault::vault_command())
        .subcommand(cloud::cloud_command())
        .subcommand(vsphere::vsphere_command())
        .subcommand(credential::credential_command())
        .subcommand(util::util_command())
        .subcommand(config::config_command())
}

/// Parse the process arguments.
pub fn create_cli_commands() -> ArgMatches {
    cli_command().get_matches()
}
