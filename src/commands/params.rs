//! Shared command parameters for all CLI commands.
//!
//! Parameter names live here so that command definitions and action handlers
//! agree on them.

use crate::format::OutputFormat;
use clap::{Arg, ArgAction};
use std::path::PathBuf;

// Command groups
pub const COMMAND_VAULT: &str = "vault";
pub const COMMAND_CLOUD: &str = "cloud";
pub const COMMAND_VSPHERE: &str = "vsphere";
pub const COMMAND_CREDENTIAL: &str = "credential";
pub const COMMAND_UTIL: &str = "util";
pub const COMMAND_CONFIG: &str = "config";

// Session commands
pub const COMMAND_LOGIN: &str = "login";
pub const COMMAND_LOGOFF: &str = "logoff";

// Resource commands
pub const COMMAND_ACCOUNT: &str = "account";
pub const COMMAND_SEARCH: &str = "search";
pub const COMMAND_GET: &str = "get";
pub const COMMAND_PASSWORD: &str = "password";
pub const COMMAND_QUERY: &str = "query";
pub const COMMAND_VM: &str = "vm";
pub const COMMAND_DATASTORE: &str = "datastore";
pub const COMMAND_LIST: &str = "list";

// Credential commands
pub const COMMAND_SAVE: &str = "save";
pub const COMMAND_FORGET: &str = "forget";
pub const COMMAND_PROTECT: &str = "protect";

// Utility commands
pub const COMMAND_BASE64: &str = "base64";
pub const COMMAND_ENCODE: &str = "encode";
pub const COMMAND_DECODE: &str = "decode";
pub const COMMAND_TIME: &str = "time";
pub const COMMAND_TO_EPOCH: &str = "to-epoch";
pub const COMMAND_FROM_EPOCH: &str = "from-epoch";

// Config commands
pub const COMMAND_SHOW: &str = "show";
pub const COMMAND_PATH: &str = "path";
pub const COMMAND_SET: &str = "set";

// Parameter names
pub const PARAMETER_VERBOSE: &str = "verbose";
pub const PARAMETER_FORMAT: &str = "format";
pub const PARAMETER_PRETTY: &str = "pretty";
pub const PARAMETER_HEADERS: &str = "headers";
pub const PARAMETER_SERVER: &str = "server";
pub const PARAMETER_TOKEN: &str = "token";
pub const PARAMETER_USERNAME: &str = "username";
pub const PARAMETER_PASSWORD: &str = "password";
pub const PARAMETER_INTERACTIVE: &str = "interactive";
pub const PARAMETER_APPROVE_ALL_CERTIFICATES: &str = "approve-all-certificates";
pub const PARAMETER_CREDENTIAL_DIR: &str = "credential-dir";
pub const PARAMETER_REVEAL: &str = "reveal";
pub const PARAMETER_ID: &str = "id";
pub const PARAMETER_SEARCH: &str = "search";
pub const PARAMETER_PAGE_SIZE: &str = "page-size";
pub const PARAMETER_REASON: &str = "reason";
pub const PARAMETER_TYPE: &str = "type";
pub const PARAMETER_FILTER: &str = "filter";
pub const PARAMETER_NAME: &str = "name";
pub const PARAMETER_NAMESPACE: &str = "namespace";
pub const PARAMETER_TEXT: &str = "text";
pub const PARAMETER_TIMESTAMP: &str = "timestamp";
pub const PARAMETER_SECONDS: &str = "seconds";
pub const PARAMETER_AUTH_METHOD: &str = "auth-method";
pub const PARAMETER_ORG: &str = "org";

/// Namespaces that carry connection settings.
pub const CONNECTION_NAMESPACES: [&str; 3] = ["vault", "cloud", "vsphere"];

pub fn verbose_parameter() -> Arg {
    Arg::new(PARAMETER_VERBOSE)
        .short('v')
        .long(PARAMETER_VERBOSE)
        .action(ArgAction::SetTrue)
        .global(true)
        .help("Enable verbose output for debugging")
}

pub fn format_parameter() -> Arg {
    Arg::new(PARAMETER_FORMAT)
        .short('f')
        .long(PARAMETER_FORMAT)
        .num_args(1)
        .required(false)
        .env("ADMINCTL_FORMAT")
        .default_value("json")
        .help("Output data format")
        .value_parser(OutputFormat::names())
}

pub fn format_pretty_parameter() -> Arg {
    Arg::new(PARAMETER_PRETTY)
        .long(PARAMETER_PRETTY)
        .action(ArgAction::SetTrue)
        .required(false)
        .help("Format the output pretty")
}

pub fn format_with_headers_parameter() -> Arg {
    Arg::new(PARAMETER_HEADERS)
        .long(PARAMETER_HEADERS)
        .action(ArgAction::SetTrue)
        .required(false)
        .env("ADMINCTL_HEADERS")
        .help("Include a header row in CSV output")
}

/// `--format`, `--pretty` and `--headers`.
pub fn output_parameters() -> Vec<Arg> {
    vec![
        format_parameter(),
        format_pretty_parameter(),
        format_with_headers_parameter(),
    ]
}

pub fn server_parameter() -> Arg {
    Arg::new(PARAMETER_SERVER)
        .short('s')
        .long(PARAMETER_SERVER)
        .num_args(1)
        .required(false)
        .help("Server host name or URL (falls back to the configured server)")
}

pub fn username_parameter() -> Arg {
    Arg::new(PARAMETER_USERNAME)
        .short('u')
        .long(PARAMETER_USERNAME)
        .num_args(1)
        .required(false)
        .help("Identity to log in as")
}

pub fn password_parameter() -> Arg {
    Arg::new(PARAMETER_PASSWORD)
        .short('p')
        .long(PARAMETER_PASSWORD)
        .num_args(1)
        .required(false)
        .help("Password, as plain text or a protected envelope")
}

pub fn interactive_parameter() -> Arg {
    Arg::new(PARAMETER_INTERACTIVE)
        .short('i')
        .long(PARAMETER_INTERACTIVE)
        .action(ArgAction::SetTrue)
        .help("Prompt for missing credentials")
}

pub fn credential_dir_parameter() -> Arg {
    Arg::new(PARAMETER_CREDENTIAL_DIR)
        .long(PARAMETER_CREDENTIAL_DIR)
        .num_args(1)
        .required(false)
        .help("Directory holding saved credential files")
        .value_parser(clap::value_parser!(PathBuf))
}

pub fn token_parameter() -> Arg {
    Arg::new(PARAMETER_TOKEN)
        .short('t')
        .long(PARAMETER_TOKEN)
        .num_args(1)
        .required(false)
        .help("Token from an earlier login; skips authentication")
}

pub fn approve_all_certificates_parameter() -> Arg {
    Arg::new(PARAMETER_APPROVE_ALL_CERTIFICATES)
        .long(PARAMETER_APPROVE_ALL_CERTIFICATES)
        .visible_alias("insecure")
        .action(ArgAction::SetTrue)
        .help("Accept any server certificate for this session")
}

/// Every argument a command needs to open a session.
pub fn connection_parameters() -> Vec<Arg> {
    vec![
        server_parameter(),
        token_parameter(),
        username_parameter(),
        password_parameter(),
        interactive_parameter(),
        approve_all_certificates_parameter(),
        credential_dir_parameter(),
    ]
}

/// Ending a session needs the token printed by `login`.
pub fn logoff_parameters() -> Vec<Arg> {
    vec![
        server_parameter(),
        token_parameter()
            .required(true)
            .help("Token printed by login for the session to end"),
        approve_all_certificates_parameter(),
    ]
}

pub fn reveal_parameter() -> Arg {
    Arg::new(PARAMETER_REVEAL)
        .long(PARAMETER_REVEAL)
        .action(ArgAction::SetTrue)
        .help("Print the plain value instead of the protected envelope")
}

pub fn page_size_parameter(default: &'static str) -> Arg {
    Arg::new(PARAMETER_PAGE_SIZE)
        .long(PARAMETER_PAGE_SIZE)
        .num_args(1)
        .default_value(default)
        .help("Records requested per page")
        .value_parser(clap::value_parser!(u32).range(1..))
}

pub fn namespace_parameter() -> Arg {
    Arg::new(PARAMETER_NAMESPACE)
        .short('n')
        .long(PARAMETER_NAMESPACE)
        .num_args(1)
        .required(false)
        .help("Use the credential directory configured for this API family")
        .value_parser(CONNECTION_NAMESPACES)
}
