//! `ANY /echo` (spec §6): mirrors the request back as JSON and honors
//! `X-Echo-*` headers for ad-hoc fault injection without a pre-registered
//! scenario. Also the dispatcher's fallback when no scenario matches or a
//! probability gate falls through (spec §4.C, §4.D).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use rand::Rng;
use serde_json::{Value, json};

use crate::handlers::dispatch::{flatten_headers, parse_body};
use crate::handlers::AppState;

/// Raw payload cap for `X-Echo-Response-Size` (spec §5: "Generated echo body
/// capped at 10 MiB").
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// The axum route handler for `ANY /echo`.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let flat_headers = flatten_headers(&headers);
    respond(&state, method.as_str(), uri.path(), &query, &flat_headers, &body).await
}

/// Shared echo logic, also used by the catch-all dispatcher as its
/// no-match / probability-gate-miss fallback.
pub async fn respond(
    state: &AppState,
    method: &str,
    path: &str,
    query: &HashMap<String, String>,
    headers: &HashMap<String, String>,
    body: &Bytes,
) -> Response {
    if let Some(delay) = resolve_delay(headers, state) {
        if !delay.is_zero() {
            state.record_fault("delay", path);
            tokio::time::sleep(delay).await;
        }
    }

    let status = resolve_status(headers, state.settings.echo_chaos_probability);
    if status >= 400 {
        state.record_fault("http_error", path);
    }

    let mut builder = Response::builder().status(status);
    if let Some(extra) = headers.get("x-echo-headers") {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(extra) {
            for (name, value) in map {
                if let Some(v) = value.as_str() {
                    builder = builder.header(name, v);
                }
            }
        }
    }
    for (name, value) in set_header_overrides(headers) {
        builder = builder.header(name, value);
    }

    let response_body = if let Some(size) = resolve_response_size(headers) {
        vec![b'A'; size]
    } else if let Some(override_body) = headers.get("x-echo-body") {
        override_body.clone().into_bytes()
    } else {
        default_echo_body(state, method, path, query, headers, body).to_string().into_bytes()
    };

    builder
        .body(axum::body::Body::from(response_body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn default_echo_body(
    state: &AppState,
    method: &str,
    path: &str,
    query: &HashMap<String, String>,
    headers: &HashMap<String, String>,
    body: &Bytes,
) -> Value {
    json!({
        "method": method,
        "path": path,
        "query": query,
        "headers": headers,
        "body": parse_body(headers, body),
        "hostname": state.hostname,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })
}

fn resolve_status(headers: &HashMap<String, String>, chaos_probability: f64) -> StatusCode {
    if let Some(raw) = headers.get("x-echo-status") {
        if let Ok(code) = raw.parse::<u16>() {
            if let Ok(status) = StatusCode::from_u16(code) {
                return status;
            }
        }
    }
    if chaos_probability > 0.0 && rand::thread_rng().gen_bool(chaos_probability.min(1.0)) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    StatusCode::OK
}

fn resolve_delay(headers: &HashMap<String, String>, state: &AppState) -> Option<Duration> {
    if let Some(raw) = headers.get("x-echo-delay") {
        if let Some(d) = parse_duration_loose(raw) {
            return Some(d);
        }
    }
    if let Some(raw) = headers.get("x-echo-latency") {
        if let Some((min, max)) = parse_range(raw) {
            if max <= min {
                return Some(Duration::from_millis(min));
            }
            let millis = rand::thread_rng().gen_range(min..=max);
            return Some(Duration::from_millis(millis));
        }
    }
    if !state.settings.echo_delay.is_zero() {
        return Some(state.settings.echo_delay);
    }
    None
}

fn resolve_response_size(headers: &HashMap<String, String>) -> Option<usize> {
    let raw = headers.get("x-echo-response-size")?;
    let size = parse_byte_size(raw)?;
    Some(size.min(MAX_RESPONSE_SIZE))
}

fn set_header_overrides(headers: &HashMap<String, String>) -> Vec<(String, String)> {
    const PREFIX: &str = "x-echo-set-header-";
    headers
        .iter()
        .filter_map(|(k, v)| {
            k.strip_prefix(PREFIX).map(|name| (name.to_string(), v.clone()))
        })
        .collect()
}

fn parse_duration_loose(raw: &str) -> Option<Duration> {
    if let Ok(d) = humantime::parse_duration(raw) {
        return Some(d);
    }
    raw.parse::<u64>().ok().map(Duration::from_millis)
}

fn parse_range(raw: &str) -> Option<(u64, u64)> {
    let (a, b) = raw.split_once('-')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

/// Parses a byte-size string with an optional `KB|MB|GB` suffix (spec §6,
/// shared convention with the stress endpoints).
pub fn parse_byte_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    let (digits, multiplier) = if let Some(n) = raw.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = raw.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = raw.strip_suffix("KB") {
        (n, 1024)
    } else {
        (raw, 1)
    };
    digits.trim().parse::<usize>().ok().map(|n| n * multiplier)
}
