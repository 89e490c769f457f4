use clap::ArgMatches;

use crate::{
    actions::{
        connect_options, output_format, print_formatted, print_secret, required_text, text,
    },
    cloud::{CloudApi, CloudClient, DEFAULT_PAGE_SIZE},
    commands::params::{PARAMETER_FILTER, PARAMETER_ORG, PARAMETER_PAGE_SIZE, PARAMETER_TYPE},
    connector::SessionConnector,
    context::ExecutionContext,
    error::CliError,
};

fn cloud_connector(
    ctx: &ExecutionContext,
    matches: &ArgMatches,
) -> Result<SessionConnector<CloudApi>, CliError> {
    let cloud = ctx.configuration().cloud();
    let org = text(matches, PARAMETER_ORG).or_else(|| cloud.org.clone());
    let api = CloudApi::new(cloud.api_version.as_deref(), org.as_deref());
    ctx.connector(api)
}

pub async fn login(ctx: &mut ExecutionContext, matches: &ArgMatches) -> Result<(), CliError> {
    let connector = cloud_connector(ctx, matches)?;
    let session = connector
        .connect(ctx.session(), &connect_options(matches))
        .await?;
    print_secret(matches, session.token().value(), ctx.protector().as_ref())
}

pub async fn logoff(ctx: &mut ExecutionContext, matches: &ArgMatches) -> Result<(), CliError> {
    let connector = cloud_connector(ctx, matches)?;
    connector
        .end_session(ctx.session(), &connect_options(matches))
        .await?;
    Ok(())
}

pub async fn query(ctx: &mut ExecutionContext, matches: &ArgMatches) -> Result<(), CliError> {
    let format = output_format(matches)?;
    let record_type = required_text(matches, PARAMETER_TYPE)?;
    let filter = text(matches, PARAMETER_FILTER);
    let page_size = matches
        .get_one::<u32>(PARAMETER_PAGE_SIZE)
        .copied()
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let connector = cloud_connector(ctx, matches)?;
    let session = connector
        .connect(ctx.session(), &connect_options(matches))
        .await?;
    let records = CloudClient::new(&session)
        .query(&record_type, filter.as_deref(), page_size)
        .await;
    connector.release(&session).await;

    print_formatted(&records?, &format)
}
