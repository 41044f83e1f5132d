//! `faultline serve`: preloads scenarios (if any), then binds and runs the
//! HTTP listener until interrupted.

use tokio_util::sync::CancellationToken;

use crate::cli::args::ServeArgs;
use crate::config;
use crate::config::schema::ServerSettings;
use crate::error::Result;
use crate::observability;
use crate::server::Server;

pub async fn run(args: &ServeArgs, shutdown: CancellationToken) -> Result<()> {
    observability::init_metrics()?;

    let mut settings = ServerSettings::from_env();
    if let Some(port) = args.port {
        settings.port = port;
    }
    if args.metrics_port.is_some() {
        tracing::warn!(
            "--metrics-port is ignored; Prometheus metrics are exposed via GET /metrics on the main listener"
        );
    }

    let preloaded = match &args.config {
        Some(path) => config::load_scenarios(path)?,
        None => Vec::new(),
    };
    tracing::info!(count = preloaded.len(), "preloaded scenarios");

    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_shutdown.cancel();
        }
    });

    let server = Server::new(settings, preloaded, shutdown);
    server.run().await
}
