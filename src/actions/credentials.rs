use std::path::PathBuf;
use std::str::FromStr;

use clap::ArgMatches;
use serde::Serialize;
use tracing::info;

use crate::{
    actions::{output_format, print_formatted, required_text, text},
    commands::params::{
        PARAMETER_CREDENTIAL_DIR, PARAMETER_NAMESPACE, PARAMETER_PASSWORD, PARAMETER_SERVER,
        PARAMETER_TEXT, PARAMETER_USERNAME,
    },
    context::ExecutionContext,
    credential::{Credential, CredentialOrigin},
    credential_file::CredentialFileStore,
    error::CliError,
    error_utils::report_warning,
    format::{format_rows, CsvRecordProducer, Formattable, FormattingError, OutputFormat},
    secret::Secret,
    session_context::Namespace,
};

#[derive(Debug, Clone, Serialize)]
pub struct CredentialFileEntry {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct CredentialFileList(pub Vec<CredentialFileEntry>);

impl CsvRecordProducer for CredentialFileList {
    fn csv_header(&self) -> Vec<String> {
        vec!["NAME".to_string(), "PATH".to_string()]
    }

    fn as_csv_records(&self) -> Vec<Vec<String>> {
        self.0
            .iter()
            .map(|entry| vec![entry.name.clone(), entry.path.display().to_string()])
            .collect()
    }
}

impl Formattable for CredentialFileList {
    fn format(&self, f: &OutputFormat) -> Result<String, FormattingError> {
        format_rows(self, f)
    }
}

fn store(ctx: &ExecutionContext, matches: &ArgMatches) -> Result<CredentialFileStore, CliError> {
    let namespace = match text(matches, PARAMETER_NAMESPACE) {
        // values are restricted by clap
        Some(name) => Namespace::from_str(&name).unwrap_or(Namespace::Utils),
        None => Namespace::Utils,
    };
    let directory = matches.get_one::<PathBuf>(PARAMETER_CREDENTIAL_DIR);
    ctx.credential_store(namespace, directory.map(PathBuf::as_path))
}

pub fn save(ctx: &mut ExecutionContext, matches: &ArgMatches) -> Result<(), CliError> {
    let store = store(ctx, matches)?;
    let prompter = ctx.prompter();
    let server = text(matches, PARAMETER_SERVER);

    let identity = match text(matches, PARAMETER_USERNAME) {
        Some(identity) => identity,
        None => prompter.identity("User name:", None)?,
    };
    let secret = match text(matches, PARAMETER_PASSWORD) {
        Some(raw) => Secret::parse(&raw, ctx.protector().as_ref()),
        None => Secret::PlainText(prompter.secret(&format!("Password for {}:", identity))?),
    };
    if secret.is_empty() {
        return Err(crate::resolver::ResolveError::EmptySecret(identity).into());
    }

    let credential = Credential::new(identity, secret, CredentialOrigin::Explicit);
    let path = store.save(server.as_deref(), &credential)?;
    info!("Saved credential for {}", credential.identity());
    println!("{}", path.display());
    Ok(())
}

pub fn list(ctx: &mut ExecutionContext, matches: &ArgMatches) -> Result<(), CliError> {
    let format = output_format(matches)?;
    let store = store(ctx, matches)?;
    let entries = store
        .list()?
        .into_iter()
        .map(|path| CredentialFileEntry {
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path,
        })
        .collect();
    print_formatted(&CredentialFileList(entries), &format)
}

pub fn forget(ctx: &mut ExecutionContext, matches: &ArgMatches) -> Result<(), CliError> {
    let store = store(ctx, matches)?;
    let server = text(matches, PARAMETER_SERVER);
    let identity = required_text(matches, PARAMETER_USERNAME)?;

    let path = store.path_for(server.as_deref(), &identity);
    if store.remove(server.as_deref(), &identity)? {
        println!("{}", path.display());
    } else {
        report_warning(&format!("no credential file at {}", path.display()));
    }
    Ok(())
}

pub fn protect(ctx: &mut ExecutionContext, matches: &ArgMatches) -> Result<(), CliError> {
    let protector = ctx.protector();
    let secret = match text(matches, PARAMETER_TEXT) {
        Some(plain) => Secret::plain(plain),
        None => Secret::PlainText(ctx.prompter().secret("Secret to protect:")?),
    };
    println!("{}", secret.to_envelope(protector.as_ref())?);
    Ok(())
}
