//! Vault command definitions.

use crate::commands::params::{
    connection_parameters, logoff_parameters, output_parameters, page_size_parameter, reveal_parameter,
    COMMAND_ACCOUNT, COMMAND_GET, COMMAND_LOGIN, COMMAND_LOGOFF, COMMAND_PASSWORD,
    COMMAND_SEARCH, COMMAND_VAULT, PARAMETER_AUTH_METHOD, PARAMETER_ID, PARAMETER_REASON,
    PARAMETER_SEARCH,
};
use clap::{Arg, Command};

const VAULT_AUTH_METHODS: [&str; 4] = ["CyberArk", "LDAP", "RADIUS", "Windows"];

fn auth_method_parameter() -> Arg {
    Arg::new(PARAMETER_AUTH_METHOD)
        .long(PARAMETER_AUTH_METHOD)
        .num_args(1)
        .required(false)
        .help("Authentication method (defaults to the configured one, then CyberArk)")
        .value_parser(VAULT_AUTH_METHODS)
        .ignore_case(true)
}

pub fn vault_command() -> Command {
    Command::new(COMMAND_VAULT)
        .about("Privileged access vault operations")
        .subcommand_required(true)
        .subcommand(
            Command::new(COMMAND_LOGIN)
                .about("Log in and print the session token")
                .args(connection_parameters())
                .arg(auth_method_parameter())
                .arg(reveal_parameter()),
        )
        .subcommand(
            Command::new(COMMAND_LOGOFF)
                .about("End a vault session")
                .args(logoff_parameters())
                .arg(auth_method_parameter()),
        )
        .subcommand(
            Command::new(COMMAND_ACCOUNT)
                .about("Account operations")
                .subcommand_required(true)
                .subcommand(
                    Command::new(COMMAND_SEARCH)
                        .about("Search accounts")
                        .args(connection_parameters())
                        .arg(auth_method_parameter())
                        .args(output_parameters())
                        .arg(
                            Arg::new(PARAMETER_SEARCH)
                                .long(PARAMETER_SEARCH)
                                .num_args(1)
                                .required(false)
                                .help("Keywords to search for"),
                        )
                        .arg(page_size_parameter("100")),
                )
                .subcommand(
                    Command::new(COMMAND_GET)
                        .about("Get one or more accounts by id")
                        .args(connection_parameters())
                        .arg(auth_method_parameter())
                        .args(output_parameters())
                        .arg(
                            Arg::new(PARAMETER_ID)
                                .num_args(1..)
                                .required(true)
                                .help("Account ids"),
                        ),
                )
                .subcommand(
                    Command::new(COMMAND_PASSWORD)
                        .about("Retrieve an account password")
                        .args(connection_parameters())
                        .arg(auth_method_parameter())
                        .arg(reveal_parameter())
                        .arg(Arg::new(PARAMETER_ID).required(true).help("Account id"))
                        .arg(
                            Arg::new(PARAMETER_REASON)
                                .long(PARAMETER_REASON)
                                .num_args(1)
                                .required(false)
                                .help("Reason recorded with the retrieval"),
                        ),
                ),
        )
}
