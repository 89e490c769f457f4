//! Credential file command definitions.

use crate::commands::params::{
    credential_dir_parameter, namespace_parameter, output_parameters, password_parameter,
    server_parameter, username_parameter, COMMAND_CREDENTIAL, COMMAND_FORGET, COMMAND_LIST,
    COMMAND_PROTECT, COMMAND_SAVE, PARAMETER_TEXT,
};
use clap::{Arg, Command};

fn location_parameters() -> Vec<Arg> {
    vec![namespace_parameter(), credential_dir_parameter()]
}

pub fn credential_command() -> Command {
    Command::new(COMMAND_CREDENTIAL)
        .about("Saved credential files")
        .subcommand_required(true)
        .subcommand(
            Command::new(COMMAND_SAVE)
                .about("Save a credential, prompting for anything not given")
                .arg(server_parameter().help("Server the credential is for; omit for an identity-only file"))
                .arg(username_parameter())
                .arg(password_parameter())
                .args(location_parameters()),
        )
        .subcommand(
            Command::new(COMMAND_LIST)
                .about("List saved credential files")
                .visible_alias("ls")
                .args(location_parameters())
                .args(output_parameters()),
        )
        .subcommand(
            Command::new(COMMAND_FORGET)
                .about("Delete a saved credential file")
                .arg(server_parameter())
                .arg(username_parameter().required(true))
                .args(location_parameters()),
        )
        .subcommand(
            Command::new(COMMAND_PROTECT)
                .about("Turn a plain-text secret into a protected envelope")
                .arg(
                    Arg::new(PARAMETER_TEXT)
                        .required(false)
                        .help("Secret to protect; prompted for when omitted"),
                ),
        )
}
