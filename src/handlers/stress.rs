//! CPU and memory stress endpoints (spec §6): `GET /api/stress/cpu/{duration}`
//! and `GET /api/stress/mem/{size}`. Out of scope for the core per spec §1
//! ("specified only at their interface") — kept intentionally simple.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::handlers::echo::parse_byte_size;
use crate::handlers::AppState;

/// Burns CPU on a blocking thread for the requested duration (spec §5:
/// "intentionally burn CPU... the stress endpoints do not observe
/// cancellation; their duration/size is the only bound").
pub async fn cpu(State(state): State<Arc<AppState>>, Path(duration): Path<String>) -> Response {
    let Some(duration) = humantime::parse_duration(&duration).ok() else {
        return bad_request("invalid duration");
    };

    state.record_fault("cpu_stress", "/api/stress/cpu");
    let deadline = Instant::now() + duration;
    tokio::task::spawn_blocking(move || {
        while Instant::now() < deadline {
            std::hint::black_box(fibonacci(20));
        }
    })
    .await
    .ok();

    axum::Json(json!({ "stressed": "cpu", "duration_ms": duration.as_millis() })).into_response()
}

/// Allocates and zero-fills the requested number of bytes, holds briefly,
/// then releases it (spec §5: "Memory-stress allocation: as requested, no
/// cap").
pub async fn mem(State(state): State<Arc<AppState>>, Path(size): Path<String>) -> Response {
    let Some(bytes) = parse_byte_size(&size) else {
        return bad_request("invalid size");
    };

    state.record_fault("memory_stress", "/api/stress/mem");
    let block = tokio::task::spawn_blocking(move || vec![0u8; bytes])
        .await
        .unwrap_or_default();
    tokio::time::sleep(Duration::from_millis(500)).await;
    let allocated = block.len();
    drop(block);

    axum::Json(json!({ "stressed": "memory", "bytes": allocated })).into_response()
}

fn fibonacci(n: u64) -> u64 {
    if n < 2 { n } else { fibonacci(n - 1) + fibonacci(n - 2) }
}

fn bad_request(msg: &str) -> Response {
    (StatusCode::BAD_REQUEST, axum::Json(json!({ "error": msg }))).into_response()
}
