//! Middleware pipeline (spec §4.G): request-ID assignment, history +
//! metrics recording around an inflight gauge, CORS, and global rate
//! limiting. Wired onto the router in a fixed order by `transport::http`.
//!
//! The body-bounding step and the per-scenario lock-free history/metrics
//! recording follow the same shape as the teacher's `transport::http`
//! `ConnectionGuard`: a RAII-flavored "do the accounting no matter how the
//! handler exits" pattern, except here it's expressed as ordinary
//! before/after code around `next.run(..)` since axum's `Next` already
//! guarantees the inner service runs to completion or panics loudly.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::{Quota, RateLimiter};
use governor::state::{InMemoryState, NotKeyed};
use governor::clock::DefaultClock;

use crate::config::schema::ServerSettings;
use crate::history::{HistoryBuffer, RequestRecord, now_ms};
use crate::observability::metrics as obs_metrics;

/// Maximum length of a stored body snippet when `LOG_BODY` is disabled
/// (spec §4.G item 2).
const BODY_SNIPPET_CAP: usize = 256;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared state threaded through every middleware layer via
/// `axum::extract::State`, following the teacher's pattern of a single
/// `Arc<...State>` passed to `from_fn_with_state`.
pub struct MiddlewareState {
    pub history: Arc<HistoryBuffer>,
    pub settings: Arc<ServerSettings>,
    request_counter: AtomicU64,
    limiter: Option<DirectRateLimiter>,
}

impl MiddlewareState {
    #[must_use]
    pub fn new(history: Arc<HistoryBuffer>, settings: Arc<ServerSettings>) -> Self {
        let limiter = NonZeroU32::new(settings.rate_limit_rps)
            .map(|rps| RateLimiter::direct(Quota::per_second(rps)));
        Self {
            history,
            settings,
            request_counter: AtomicU64::new(1),
            limiter,
        }
    }
}

/// Extension inserted on every request carrying its resolved request ID.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Request-ID assignment/echo plus history + metrics recording (spec §4.G
/// items 1-2), combined into a single middleware because the history record
/// needs the request ID resolved before the handler runs and the metrics
/// timer needs to span the whole handler call.
pub async fn track(
    State(state): State<Arc<MiddlewareState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    mut req: Request,
    next: Next,
) -> Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| state.request_counter.fetch_add(1, Ordering::SeqCst).to_string());
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let raw_query = req.uri().query().unwrap_or("").to_string();
    let remote_addr = connect_info
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut headers: std::collections::HashMap<String, Vec<String>> =
        std::collections::HashMap::new();
    for (name, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(v.to_string());
        }
    }

    let (parts, body) = req.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => Bytes::new(),
    };
    if body_bytes.len() > state.settings.max_body_size {
        tracing::warn!(
            path = %path,
            size = body_bytes.len(),
            limit = state.settings.max_body_size,
            "request body exceeds configured MaxBodySize"
        );
    }

    let mut req = Request::from_parts(parts, Body::from(body_bytes.clone()));
    req.extensions_mut().insert(RequestId(request_id.clone()));

    obs_metrics::increment_inflight();
    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    obs_metrics::decrement_inflight();

    let status = response.status().as_u16();
    obs_metrics::record_response_duration(&path, &method, status, elapsed.as_secs_f64());

    if state.settings.log_requests {
        if state.settings.log_headers {
            tracing::info!(request_id = %request_id, method = %method, path = %path, status, remote_addr = %remote_addr, ?headers, "request");
        } else {
            tracing::info!(request_id = %request_id, method = %method, path = %path, status, remote_addr = %remote_addr, "request");
        }
    }

    let body_snippet = body_snippet(&body_bytes, state.settings.log_body);
    state.history.push(RequestRecord {
        id: request_id.clone(),
        timestamp_ms: now_ms(),
        method,
        path,
        raw_query,
        remote_addr,
        headers,
        body_snippet,
        status,
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

fn body_snippet(bytes: &Bytes, log_body: bool) -> String {
    let text = String::from_utf8_lossy(bytes);
    if log_body || text.len() <= BODY_SNIPPET_CAP {
        text.into_owned()
    } else {
        format!("{}...", &text[..BODY_SNIPPET_CAP])
    }
}

/// Permissive CORS (spec §4.G item 3): short-circuits `OPTIONS` with a bare
/// 200, otherwise tags the response with permissive headers.
pub async fn cors(State(state): State<Arc<MiddlewareState>>, req: Request, next: Next) -> Response {
    if !state.settings.enable_cors {
        return next.run(req).await;
    }

    if req.method() == Method::OPTIONS {
        return (
            StatusCode::OK,
            [
                ("access-control-allow-origin", "*"),
                ("access-control-allow-methods", "*"),
                ("access-control-allow-headers", "*"),
            ],
        )
            .into_response();
    }

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("access-control-allow-origin", HeaderValue::from_static("*"));
    response
}

/// Global token-bucket rate limit (spec §4.G item 4). A limiter is only
/// present when `RATE_LIMIT_RPS > 0`; absent, every request passes through.
pub async fn rate_limit(
    State(state): State<Arc<MiddlewareState>>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            return (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded").into_response();
        }
    }
    next.run(req).await
}
