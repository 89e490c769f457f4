//! Cloud command definitions.

use crate::commands::params::{
    connection_parameters, logoff_parameters, output_parameters, page_size_parameter, reveal_parameter,
    COMMAND_CLOUD, COMMAND_LOGIN, COMMAND_LOGOFF, COMMAND_QUERY, PARAMETER_FILTER, PARAMETER_ORG,
    PARAMETER_TYPE,
};
use clap::{Arg, Command};

fn org_parameter() -> Arg {
    Arg::new(PARAMETER_ORG)
        .long(PARAMETER_ORG)
        .num_args(1)
        .required(false)
        .help("Organization appended to the user name as user@org")
}

pub fn cloud_command() -> Command {
    Command::new(COMMAND_CLOUD)
        .about("Cloud infrastructure operations")
        .subcommand_required(true)
        .subcommand(
            Command::new(COMMAND_LOGIN)
                .about("Log in and print the session token")
                .args(connection_parameters())
                .arg(org_parameter())
                .arg(reveal_parameter()),
        )
        .subcommand(
            Command::new(COMMAND_LOGOFF)
                .about("End a cloud session")
                .args(logoff_parameters())
                .arg(org_parameter()),
        )
        .subcommand(
            Command::new(COMMAND_QUERY)
                .about("Run a typed query and collect every page")
                .args(connection_parameters())
                .arg(org_parameter())
                .args(output_parameters())
                .arg(
                    Arg::new(PARAMETER_TYPE)
                        .long(PARAMETER_TYPE)
                        .num_args(1)
                        .required(true)
                        .help("Query type, e.g. vm, orgVdc, edgeGateway"),
                )
                .arg(
                    Arg::new(PARAMETER_FILTER)
                        .long(PARAMETER_FILTER)
                        .num_args(1)
                        .required(false)
                        .help("Query filter, e.g. name==web*"),
                )
                .arg(page_size_parameter("128")),
        )
}
