use clap::ArgMatches;

use crate::{
    actions::required_text,
    commands::params::{PARAMETER_SECONDS, PARAMETER_TEXT, PARAMETER_TIMESTAMP},
    convert,
    error::CliError,
};

pub fn base64_encode(matches: &ArgMatches) -> Result<(), CliError> {
    let text = required_text(matches, PARAMETER_TEXT)?;
    println!("{}", convert::base64_encode(&text));
    Ok(())
}

pub fn base64_decode(matches: &ArgMatches) -> Result<(), CliError> {
    let text = required_text(matches, PARAMETER_TEXT)?;
    println!("{}", convert::base64_decode(&text)?);
    Ok(())
}

pub fn to_epoch(matches: &ArgMatches) -> Result<(), CliError> {
    let timestamp = required_text(matches, PARAMETER_TIMESTAMP)?;
    println!("{}", convert::to_epoch(&timestamp)?);
    Ok(())
}

pub fn from_epoch(matches: &ArgMatches) -> Result<(), CliError> {
    let seconds = matches
        .get_one::<i64>(PARAMETER_SECONDS)
        .copied()
        .ok_or_else(|| CliError::MissingRequiredArgument(PARAMETER_SECONDS.to_string()))?;
    println!("{}", convert::from_epoch(seconds)?);
    Ok(())
}
