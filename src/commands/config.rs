//! Configuration command definitions.

use crate::commands::params::{
    credential_dir_parameter, format_pretty_parameter, server_parameter, username_parameter,
    COMMAND_CONFIG, COMMAND_PATH, COMMAND_SET, COMMAND_SHOW, CONNECTION_NAMESPACES,
    PARAMETER_APPROVE_ALL_CERTIFICATES, PARAMETER_NAMESPACE,
};
use clap::{Arg, Command};

pub fn config_command() -> Command {
    Command::new(COMMAND_CONFIG)
        .about("Configuration management")
        .subcommand_required(true)
        .subcommand(
            Command::new(COMMAND_SHOW)
                .about("Print the configuration as JSON")
                .arg(format_pretty_parameter()),
        )
        .subcommand(Command::new(COMMAND_PATH).about("Show configuration file path"))
        .subcommand(
            Command::new(COMMAND_SET)
                .about("Set connection defaults for an API family")
                .arg(
                    Arg::new(PARAMETER_NAMESPACE)
                        .required(true)
                        .value_parser(CONNECTION_NAMESPACES)
                        .help("API family"),
                )
                .arg(server_parameter().help("Default server"))
                .arg(username_parameter().help("Default identity"))
                .arg(
                    Arg::new(PARAMETER_APPROVE_ALL_CERTIFICATES)
                        .long(PARAMETER_APPROVE_ALL_CERTIFICATES)
                        .num_args(1)
                        .required(false)
                        .value_parser(clap::value_parser!(bool))
                        .help("Accept any server certificate by default"),
                )
                .arg(credential_dir_parameter()),
        )
}
