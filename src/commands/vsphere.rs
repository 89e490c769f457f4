//! Virtualization command definitions.

use crate::commands::params::{
    connection_parameters, logoff_parameters, output_parameters, reveal_parameter, COMMAND_DATASTORE, COMMAND_LIST,
    COMMAND_LOGIN, COMMAND_LOGOFF, COMMAND_VM, COMMAND_VSPHERE, PARAMETER_NAME,
};
use clap::{Arg, ArgAction, Command};

pub fn vsphere_command() -> Command {
    Command::new(COMMAND_VSPHERE)
        .about("Virtualization management operations")
        .subcommand_required(true)
        .subcommand(
            Command::new(COMMAND_LOGIN)
                .about("Log in and print the session id")
                .args(connection_parameters())
                .arg(reveal_parameter()),
        )
        .subcommand(
            Command::new(COMMAND_LOGOFF)
                .about("End a session")
                .args(logoff_parameters()),
        )
        .subcommand(
            Command::new(COMMAND_VM)
                .about("Virtual machine operations")
                .subcommand_required(true)
                .subcommand(
                    Command::new(COMMAND_LIST)
                        .about("List virtual machines")
                        .visible_alias("ls")
                        .args(connection_parameters())
                        .args(output_parameters())
                        .arg(
                            Arg::new(PARAMETER_NAME)
                                .long(PARAMETER_NAME)
                                .num_args(1)
                                .action(ArgAction::Append)
                                .help("Only VMs with this name (repeatable)"),
                        ),
                ),
        )
        .subcommand(
            Command::new(COMMAND_DATASTORE)
                .about("Datastore operations")
                .subcommand_required(true)
                .subcommand(
                    Command::new(COMMAND_LIST)
                        .about("List datastores")
                        .visible_alias("ls")
                        .args(connection_parameters())
                        .args(output_parameters()),
                ),
        )
}
