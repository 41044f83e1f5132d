//! Static documentation/demo pages (spec §6): `/docs/`, `/web-ws`,
//! `/web-sse`, `/favicon.ico`. Out of scope for the core — fixed bodies,
//! no templating.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

pub async fn docs() -> Response {
    html(include_str!("../../assets/docs.html"))
}

pub async fn web_ws() -> Response {
    html(include_str!("../../assets/web_ws.html"))
}

pub async fn web_sse() -> Response {
    html(include_str!("../../assets/web_sse.html"))
}

pub async fn favicon() -> Response {
    (StatusCode::NO_CONTENT, ()).into_response()
}

fn html(body: &'static str) -> Response {
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response()
}
