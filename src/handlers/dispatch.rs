//! Catch-all scenario dispatch (spec §2 "Control flow per request"): wires
//! the path matcher (§4.B), request matcher (§4.C), response selector
//! (§4.D), circuit breaker (§4.E), and body template engine (§4.F) into the
//! single handler that axum falls back to for any path not bound to a
//! fixed route.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::dynamic::context::{RequestContext as TemplateRequestContext, ServerContext, TemplateContext};
use crate::dynamic::template;
use crate::handlers::echo;
use crate::handlers::AppState;
use crate::middleware::RequestId;
use crate::routing::{matcher, path as path_matcher};
use crate::scenarios::model::Response as ScenarioResponse;
use crate::scenarios::selector::{self, Selection};

pub async fn handle(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    axum::extract::Extension(request_id): axum::extract::Extension<RequestId>,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let method_str = method.as_str().to_string();

    let Some(resolved) = path_matcher::resolve(&state.registry, &path, &method_str) else {
        return not_found();
    };
    let Some(candidates) = state.registry.lookup(&resolved.key) else {
        return not_found();
    };

    let flat_headers = flatten_headers(&headers);
    let facts = matcher::RequestFacts {
        headers: &flat_headers,
        query: &query,
        body: &body,
    };

    let matched = candidates.iter().find(|s| matcher::matches(&s.matches, &facts));

    let Some(scenario) = matched else {
        return echo::respond(
            &state,
            &method_str,
            &path,
            &query,
            &flat_headers,
            &body,
        )
        .await;
    };

    if let Some(breaker) = &scenario.breaker {
        if breaker.admit() == crate::breaker::Admission::ShortCircuit {
            return (StatusCode::SERVICE_UNAVAILABLE, "circuit breaker open").into_response();
        }
    }

    match selector::select(scenario) {
        Selection::FallThrough => {
            if let Some(breaker) = &scenario.breaker {
                breaker.record_outcome(true);
            }
            echo::respond(&state, &method_str, &path, &query, &flat_headers, &body).await
        }
        Selection::Serve(response) => {
            let rendered = render_and_serve(
                &state,
                response,
                &request_id.0,
                &method_str,
                &path,
                &query,
                &flat_headers,
                &resolved.vars,
                &body,
            )
            .await;

            if let Some(breaker) = &scenario.breaker {
                let success = rendered.as_ref().is_ok_and(|(status, _)| *status < 500);
                breaker.record_outcome(success);
            }

            match rendered {
                Ok((status, built)) => {
                    if status >= 400 {
                        state.record_fault("http_error", &path);
                    }
                    built
                }
                Err(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "template render error").into_response()
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn render_and_serve(
    state: &AppState,
    response: &ScenarioResponse,
    request_id: &str,
    method: &str,
    path: &str,
    query: &HashMap<String, String>,
    headers: &HashMap<String, String>,
    path_vars: &HashMap<String, String>,
    body: &Bytes,
) -> crate::error::Result<(u16, Response)> {
    if let Some(delay) = response.resolve_delay() {
        if !delay.is_zero() {
            state.record_fault("delay", path);
            tokio::time::sleep(delay).await;
        }
    }

    let parsed_body = parse_body(headers, body);
    let ctx = TemplateContext {
        request: TemplateRequestContext {
            id: request_id.to_string(),
            method: method.to_string(),
            path: path.to_string(),
            query: query.clone(),
            headers: headers.clone(),
            path_vars: path_vars.clone(),
            body: parsed_body,
        },
        server: ServerContext {
            hostname: state.hostname.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            fault_type: fault_type_for(response),
        },
    };

    let rendered_body = if template::has_templates(&response.body) {
        template::render(&response.body, &ctx)?
    } else {
        response.body.clone()
    };

    let mut builder = Response::builder().status(response.status);
    for (name, value) in &response.headers {
        builder = builder.header(name, value);
    }

    let body_bytes = if response.gzip {
        builder = builder.header("content-encoding", "gzip");
        gzip_compress(rendered_body.as_bytes())
    } else {
        rendered_body.into_bytes()
    };

    let built = builder
        .body(axum::body::Body::from(body_bytes))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response());

    Ok((response.status, built))
}

fn fault_type_for(response: &ScenarioResponse) -> String {
    if response.resolve_delay().is_some_and(|d| !d.is_zero()) {
        "delay".to_string()
    } else if response.status >= 400 {
        "http_error".to_string()
    } else {
        "none".to_string()
    }
}

fn gzip_compress(data: &[u8]) -> Vec<u8> {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    if encoder.write_all(data).is_err() {
        return data.to_vec();
    }
    encoder.finish().unwrap_or_else(|_| data.to_vec())
}

/// Flattens multi-valued headers to their first value per name, keys
/// lower-cased (spec §4.C).
pub fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut flat = HashMap::new();
    for (name, value) in headers {
        if let Ok(v) = value.to_str() {
            flat.entry(name.as_str().to_lowercase()).or_insert_with(|| v.to_string());
        }
    }
    flat
}

/// Parses the request body as JSON when Content-Type says so and it parses
/// cleanly; otherwise exposes it as a raw string (spec §4.F).
pub fn parse_body(headers: &HashMap<String, String>, body: &Bytes) -> Value {
    let is_json = headers
        .get("content-type")
        .is_some_and(|ct| ct.contains("application/json"));

    if is_json {
        if let Ok(value) = serde_json::from_slice::<Value>(body) {
            return value;
        }
    }
    Value::String(String::from_utf8_lossy(body).into_owned())
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, axum::Json(serde_json::json!({ "error": "not found" }))).into_response()
}
