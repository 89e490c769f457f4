use adminctl::{
    cli::execute_command,
    commands::{create_cli_commands, PARAMETER_VERBOSE},
    error_utils::report_error,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let matches = create_cli_commands();

    // -v wins over RUST_LOG
    let filter = if matches.get_flag(PARAMETER_VERBOSE) {
        EnvFilter::new("adminctl=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = execute_command(&matches).await {
        report_error(&e);
        ::std::process::exit(e.exit_code().code());
    }
}
