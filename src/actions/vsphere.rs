use clap::ArgMatches;

use crate::{
    actions::{connect_options, output_format, print_formatted, print_secret},
    commands::params::PARAMETER_NAME,
    context::ExecutionContext,
    error::CliError,
    vsphere::{VSphereApi, VSphereClient},
};

pub async fn login(ctx: &mut ExecutionContext, matches: &ArgMatches) -> Result<(), CliError> {
    let connector = ctx.connector(VSphereApi)?;
    let session = connector
        .connect(ctx.session(), &connect_options(matches))
        .await?;
    print_secret(matches, session.token().value(), ctx.protector().as_ref())
}

pub async fn logoff(ctx: &mut ExecutionContext, matches: &ArgMatches) -> Result<(), CliError> {
    let connector = ctx.connector(VSphereApi)?;
    connector
        .end_session(ctx.session(), &connect_options(matches))
        .await?;
    Ok(())
}

pub async fn list_vms(ctx: &mut ExecutionContext, matches: &ArgMatches) -> Result<(), CliError> {
    let format = output_format(matches)?;
    let names: Vec<String> = matches
        .get_many::<String>(PARAMETER_NAME)
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let connector = ctx.connector(VSphereApi)?;
    let session = connector
        .connect(ctx.session(), &connect_options(matches))
        .await?;
    let vms = VSphereClient::new(&session).list_vms(&names).await;
    connector.release(&session).await;

    print_formatted(&vms?, &format)
}

pub async fn list_datastores(
    ctx: &mut ExecutionContext,
    matches: &ArgMatches,
) -> Result<(), CliError> {
    let format = output_format(matches)?;

    let connector = ctx.connector(VSphereApi)?;
    let session = connector
        .connect(ctx.session(), &connect_options(matches))
        .await?;
    let datastores = VSphereClient::new(&session).list_datastores().await;
    connector.release(&session).await;

    print_formatted(&datastores?, &format)
}
