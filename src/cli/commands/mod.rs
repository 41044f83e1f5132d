//! CLI command dispatch: routes parsed arguments to the `serve`/`validate`
//! handlers.

pub mod serve;
pub mod validate;

use tokio_util::sync::CancellationToken;

use crate::cli::args::{Cli, Commands};
use crate::error::Result;

/// Dispatches a parsed CLI invocation.
pub async fn dispatch(cli: Cli, cancel: CancellationToken) -> Result<()> {
    match cli.command {
        Commands::Serve(args) => serve::run(&args, cancel).await,
        Commands::Validate(args) => validate::run(&args),
    }
}
