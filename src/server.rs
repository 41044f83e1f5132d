//! Server assembly (spec §2): wires the scenario registry, history buffer,
//! settings, and middleware state into a running axum listener.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::schema::ServerSettings;
use crate::error::Result;
use crate::handlers::AppState;
use crate::history::HistoryBuffer;
use crate::middleware::MiddlewareState;
use crate::scenarios::model::Scenario;
use crate::scenarios::registry::ScenarioRegistry;
use crate::transport::http;

/// A fully assembled faultline server, ready to bind and serve.
pub struct Server {
    settings: Arc<ServerSettings>,
    app_state: Arc<AppState>,
    middleware_state: Arc<MiddlewareState>,
    shutdown: CancellationToken,
}

impl Server {
    #[must_use]
    pub fn new(settings: ServerSettings, preloaded: Vec<Scenario>, shutdown: CancellationToken) -> Self {
        let settings = Arc::new(settings);
        let registry = Arc::new(ScenarioRegistry::new());
        for scenario in preloaded {
            registry.add(scenario);
        }
        let history = Arc::new(HistoryBuffer::new(settings.history_size));
        let middleware_state = Arc::new(MiddlewareState::new(history.clone(), settings.clone()));
        let app_state = Arc::new(AppState::new(registry, history, settings.clone(), shutdown.clone()));

        Self {
            settings,
            app_state,
            middleware_state,
            shutdown,
        }
    }

    /// Binds the configured port and serves until the shutdown token fires.
    pub async fn run(&self) -> Result<()> {
        let router = http::build_router(self.app_state.clone(), self.middleware_state.clone());
        let addr = format!("0.0.0.0:{}", self.settings.port);
        let listener = TcpListener::bind(&addr).await?;
        let bound_addr = listener.local_addr()?;
        tracing::info!(addr = %bound_addr, "faultline listening");

        if self.settings.enable_tls {
            tracing::warn!(
                "ENABLE_TLS is set, but faultline does not terminate TLS itself; \
                 run it behind a TLS-terminating proxy"
            );
        }

        let shutdown = self.shutdown.clone();
        axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;
        Ok(())
    }
}
