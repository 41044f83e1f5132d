//! Router assembly: wires every route handler and the fixed middleware
//! order from spec §4.G onto a single axum `Router`.
//!
//! Layers are applied innermost-first in code, which axum composes
//! outermost-first at request time (the last `.layer()` call wraps
//! everything added before it) — so the apparent reverse order below
//! produces the spec's listed order: request-ID/history/metrics, then
//! CORS, then rate limit, with `TraceLayer` wrapping all of it for
//! ambient span-scoped request logging.

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::{any, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{control, dispatch, echo, health, static_pages, streaming, stress, AppState};
use crate::middleware::{cors, rate_limit, track, MiddlewareState};
use crate::observability::metrics;

#[must_use]
pub fn build_router(app_state: Arc<AppState>, middleware_state: Arc<MiddlewareState>) -> Router {
    let control_routes = Router::new()
        .route("/scenario", post(control::add_scenario))
        .route("/history", get(control::history))
        .route("/api/control/reset-history", post(control::reset_history))
        .route("/api/control/reset-metrics", post(control::reset_metrics))
        .route("/replay", post(control::replay));

    let builtin_routes = Router::new()
        .route("/health", get(health::handle))
        .route("/metrics", get(metrics::handle))
        .route("/echo", any(echo::handle))
        .route("/api/stress/cpu/:duration", get(stress::cpu))
        .route("/api/stress/mem/:size", get(stress::mem))
        .route("/ws", get(streaming::ws))
        .route("/sse", get(streaming::sse))
        .route("/docs", get(static_pages::docs))
        .route("/docs/", get(static_pages::docs))
        .route("/web-ws", get(static_pages::web_ws))
        .route("/web-sse", get(static_pages::web_sse))
        .route("/favicon.ico", get(static_pages::favicon));

    control_routes
        .merge(builtin_routes)
        .fallback(dispatch::handle)
        .with_state(app_state)
        .layer(from_fn_with_state(middleware_state.clone(), rate_limit))
        .layer(from_fn_with_state(middleware_state.clone(), cors))
        .layer(from_fn_with_state(middleware_state, track))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ServerSettings;
    use crate::history::HistoryBuffer;
    use crate::scenarios::registry::ScenarioRegistry;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn router_builds_without_panicking() {
        let settings = Arc::new(ServerSettings::from_env());
        let registry = Arc::new(ScenarioRegistry::new());
        let history = Arc::new(HistoryBuffer::new(settings.history_size));
        let app_state = Arc::new(AppState::new(registry, history.clone(), settings.clone(), CancellationToken::new()));
        let middleware_state = Arc::new(MiddlewareState::new(history, settings));
        let _router = build_router(app_state, middleware_state);
    }
}
