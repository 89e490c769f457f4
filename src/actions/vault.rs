use std::str::FromStr;

use clap::ArgMatches;
use tracing::debug;

use crate::{
    actions::{
        connect_options, output_format, print_formatted, print_secret, text, CliActionError,
    },
    commands::params::{
        PARAMETER_AUTH_METHOD, PARAMETER_ID, PARAMETER_PAGE_SIZE, PARAMETER_REASON,
        PARAMETER_SEARCH,
    },
    connector::SessionConnector,
    context::ExecutionContext,
    error::CliError,
    vault::{VaultApi, VaultAuthMethod, VaultClient, DEFAULT_PAGE_SIZE},
};

fn vault_connector(
    ctx: &ExecutionContext,
    matches: &ArgMatches,
) -> Result<SessionConnector<VaultApi>, CliError> {
    let method = text(matches, PARAMETER_AUTH_METHOD)
        .or_else(|| ctx.configuration().vault().auth_method.clone());
    let method = match method {
        Some(name) => VaultAuthMethod::from_str(&name).map_err(|_| {
            CliActionError::InvalidArgument {
                name: PARAMETER_AUTH_METHOD.to_string(),
                value: name.clone(),
            }
        })?,
        None => VaultAuthMethod::default(),
    };
    debug!("Vault authentication method: {}", method);
    ctx.connector(VaultApi::new(method))
}

pub async fn login(ctx: &mut ExecutionContext, matches: &ArgMatches) -> Result<(), CliError> {
    let connector = vault_connector(ctx, matches)?;
    let session = connector
        .connect(ctx.session(), &connect_options(matches))
        .await?;
    print_secret(matches, session.token().value(), ctx.protector().as_ref())
}

pub async fn logoff(ctx: &mut ExecutionContext, matches: &ArgMatches) -> Result<(), CliError> {
    let connector = vault_connector(ctx, matches)?;
    connector
        .end_session(ctx.session(), &connect_options(matches))
        .await?;
    Ok(())
}

pub async fn search_accounts(
    ctx: &mut ExecutionContext,
    matches: &ArgMatches,
) -> Result<(), CliError> {
    let format = output_format(matches)?;
    let search = text(matches, PARAMETER_SEARCH);
    let page_size = matches
        .get_one::<u32>(PARAMETER_PAGE_SIZE)
        .copied()
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let connector = vault_connector(ctx, matches)?;
    let session = connector
        .connect(ctx.session(), &connect_options(matches))
        .await?;
    let accounts = VaultClient::new(&session)
        .search_accounts(search.as_deref(), page_size)
        .await;
    connector.release(&session).await;

    print_formatted(&accounts?, &format)
}

pub async fn get_accounts(ctx: &mut ExecutionContext, matches: &ArgMatches) -> Result<(), CliError> {
    let format = output_format(matches)?;
    let ids: Vec<String> = matches
        .get_many::<String>(PARAMETER_ID)
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let connector = vault_connector(ctx, matches)?;
    let session = connector
        .connect(ctx.session(), &connect_options(matches))
        .await?;
    let outcome = VaultClient::new(&session).get_accounts(&ids).await;
    connector.release(&session).await;

    print_formatted(&outcome, &format)?;
    if outcome.has_failures() {
        return Err(CliActionError::PartialFailure {
            failed: outcome.failed(),
            total: outcome.items.len(),
        }
        .into());
    }
    Ok(())
}

pub async fn retrieve_password(
    ctx: &mut ExecutionContext,
    matches: &ArgMatches,
) -> Result<(), CliError> {
    let id = crate::actions::required_text(matches, PARAMETER_ID)?;
    let reason = text(matches, PARAMETER_REASON);

    let connector = vault_connector(ctx, matches)?;
    let session = connector
        .connect(ctx.session(), &connect_options(matches))
        .await?;
    let password = VaultClient::new(&session)
        .retrieve_password(&id, reason.as_deref())
        .await;
    connector.release(&session).await;

    print_secret(matches, &password?, ctx.protector().as_ref())
}
