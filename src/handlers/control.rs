//! Control API (spec §4.H): register scenarios, inspect/reset history,
//! reset the fault counter, and replay a captured request.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::schema::ScenarioDef;
use crate::handlers::AppState;
use crate::history::RequestRecord;

/// `POST /scenario`: body is a single scenario object or an array of them.
pub async fn add_scenario(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) => return bad_request("invalid scenario JSON"),
    };

    let defs: Vec<ScenarioDef> = match value {
        Value::Array(_) => match serde_json::from_value(value) {
            Ok(defs) => defs,
            Err(_) => return bad_request("invalid scenario JSON"),
        },
        other => match serde_json::from_value::<ScenarioDef>(other) {
            Ok(def) => vec![def],
            Err(_) => return bad_request("invalid scenario JSON"),
        },
    };

    for def in defs {
        match def.into_scenario() {
            Ok(scenario) => state.registry.add(scenario),
            Err(e) => return bad_request(&e.to_string()),
        }
    }

    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}

/// `GET /history`: returns the buffer as JSON. When `LogBody` is true and a
/// snippet parses as JSON, it is inlined as structured JSON rather than a
/// string (spec §4.H).
pub async fn history(State(state): State<Arc<AppState>>) -> Response {
    let records: Vec<Value> = state
        .history
        .snapshot()
        .iter()
        .map(|r| record_to_json(r, state.settings.log_body))
        .collect();
    (StatusCode::OK, Json(records)).into_response()
}

fn record_to_json(record: &RequestRecord, log_body: bool) -> Value {
    let mut value = serde_json::to_value(record).unwrap_or(Value::Null);
    if log_body {
        if let Ok(parsed) = serde_json::from_str::<Value>(&record.body_snippet) {
            if let Some(obj) = value.as_object_mut() {
                obj.insert("body_snippet".to_string(), parsed);
            }
        }
    }
    value
}

/// `POST /api/control/reset-history`.
pub async fn reset_history(State(state): State<Arc<AppState>>) -> Response {
    state.history.reset();
    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}

/// `POST /api/control/reset-metrics`: resets the in-process fault counter
/// only (spec §4.H); the exported Prometheus counter itself stays
/// monotonic, which is standard Prometheus practice — see `DESIGN.md`.
pub async fn reset_metrics(State(state): State<Arc<AppState>>) -> Response {
    state.faults_injected.store(0, Ordering::Relaxed);
    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ReplayRequest {
    id: String,
    target: Option<String>,
}

/// `POST /replay`: rebuilds a captured request from history and issues it
/// against `target` (default: this server's own base URL), streaming the
/// upstream response back (spec §4.H).
pub async fn replay(State(state): State<Arc<AppState>>, Json(req): Json<ReplayRequest>) -> Response {
    let Some(record) = state.history.find(&req.id) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "replay id not found" }))).into_response();
    };

    let target = req
        .target
        .unwrap_or_else(|| format!("http://127.0.0.1:{}", state.settings.port));
    let url = format!("{}{}", target.trim_end_matches('/'), record.path);

    let method = reqwest::Method::from_bytes(record.method.as_bytes()).unwrap_or(reqwest::Method::GET);
    let mut builder = state.http_client.request(method, url);
    for (name, values) in &record.headers {
        if let Some(value) = values.first() {
            builder = builder.header(name, value);
        }
    }
    builder = builder.body(record.body_snippet.clone());

    match builder.send().await {
        Ok(upstream) => {
            let status = StatusCode::from_u16(upstream.status().as_u16())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            let mut response_builder = Response::builder().status(status);
            for (name, value) in upstream.headers() {
                response_builder = response_builder.header(name, value);
            }
            response_builder
                .body(axum::body::Body::from_stream(upstream.bytes_stream()))
                .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response())
        }
        Err(_) => (StatusCode::BAD_GATEWAY, Json(json!({ "error": "upstream replay failure" }))).into_response(),
    }
}

fn bad_request(msg: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
}
