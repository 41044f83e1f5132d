//! `GET /health` (spec §6): liveness/readiness JSON, 503 if any registered
//! check fails.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::handlers::AppState;

pub async fn handle(State(state): State<Arc<AppState>>) -> Response {
    let checks = run_checks(&state);
    let healthy = checks.values().all(|ok| *ok);

    let body = json!({
        "status": if healthy { "ok" } else { "unhealthy" },
        "uptime": state.started_at.elapsed().as_secs(),
        "checks": checks,
        "system": {
            "hostname": state.hostname,
            "scenario_keys": state.registry.key_count(),
            "history_entries": state.history.len(),
        },
    });

    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, axum::Json(body)).into_response()
}

fn run_checks(state: &AppState) -> std::collections::HashMap<&'static str, bool> {
    let mut checks = std::collections::HashMap::new();
    checks.insert("registry", true);
    checks.insert("history_buffer_within_capacity", state.history.len() <= state.settings.history_size);
    checks
}
