//! Utility command definitions.

use crate::commands::params::{
    COMMAND_BASE64, COMMAND_DECODE, COMMAND_ENCODE, COMMAND_FROM_EPOCH, COMMAND_TIME,
    COMMAND_TO_EPOCH, COMMAND_UTIL, PARAMETER_SECONDS, PARAMETER_TEXT, PARAMETER_TIMESTAMP,
};
use clap::{Arg, Command};

fn text_parameter() -> Arg {
    Arg::new(PARAMETER_TEXT).required(true).help("Input text")
}

pub fn util_command() -> Command {
    Command::new(COMMAND_UTIL)
        .about("Text conversions")
        .subcommand_required(true)
        .subcommand(
            Command::new(COMMAND_BASE64)
                .about("Base64 encoding")
                .subcommand_required(true)
                .subcommand(
                    Command::new(COMMAND_ENCODE)
                        .about("Encode UTF-8 text as base64")
                        .arg(text_parameter()),
                )
                .subcommand(
                    Command::new(COMMAND_DECODE)
                        .about("Decode base64 into UTF-8 text")
                        .arg(text_parameter()),
                ),
        )
        .subcommand(
            Command::new(COMMAND_TIME)
                .about("Unix time conversions")
                .subcommand_required(true)
                .subcommand(
                    Command::new(COMMAND_TO_EPOCH)
                        .about("RFC 3339 timestamp to seconds since the epoch")
                        .arg(Arg::new(PARAMETER_TIMESTAMP).required(true).help("e.g. 2024-02-29T12:00:00+02:00")),
                )
                .subcommand(
                    Command::new(COMMAND_FROM_EPOCH)
                        .about("Seconds since the epoch to an RFC 3339 timestamp (UTC)")
                        .arg(
                            Arg::new(PARAMETER_SECONDS)
                                .required(true)
                                .allow_negative_numbers(true)
                                .value_parser(clap::value_parser!(i64)),
                        ),
                ),
        )
}
