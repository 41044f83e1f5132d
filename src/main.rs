//! faultline - programmable HTTP fault-injection server.

use clap::Parser;
use tokio_util::sync::CancellationToken;

use faultline::cli::Cli;
use faultline::cli::commands::dispatch;
use faultline::observability::init_logging;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.verbose);

    let shutdown = CancellationToken::new();
    match dispatch(cli, shutdown).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "faultline exited with error");
            std::process::ExitCode::FAILURE
        }
    }
}
