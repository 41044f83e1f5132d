//! `/echo` header-driven faults, `/health`, and the static/built-in routes.

mod common;

use serde_json::Value;

use common::TestServer;

#[tokio::test(flavor = "multi_thread")]
async fn echo_mirrors_request_by_default() {
    let server = TestServer::start().await;
    let resp = server
        .client
        .get(server.url("/echo?hello=world"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["method"], "GET");
    assert_eq!(body["query"]["hello"], "world");

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn echo_status_header_overrides_status() {
    let server = TestServer::start().await;
    let resp = server
        .client
        .get(server.url("/echo"))
        .header("X-Echo-Status", "503")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn echo_delay_header_delays_the_response() {
    let server = TestServer::start().await;
    let start = std::time::Instant::now();
    let resp = server
        .client
        .get(server.url("/echo"))
        .header("X-Echo-Delay", "200ms")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(start.elapsed().as_millis() >= 200);

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn echo_body_header_overrides_default_body() {
    let server = TestServer::start().await;
    let resp = server
        .client
        .get(server.url("/echo"))
        .header("X-Echo-Body", "raw override")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.text().await.unwrap(), "raw override");

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn echo_response_size_caps_and_fills_payload() {
    let server = TestServer::start().await;
    let resp = server
        .client
        .get(server.url("/echo"))
        .header("X-Echo-Response-Size", "1024")
        .send()
        .await
        .unwrap();
    let body = resp.bytes().await.unwrap();
    assert_eq!(body.len(), 1024);
    assert!(body.iter().all(|&b| b == b'A'));

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn health_reports_ok_on_a_fresh_server() {
    let server = TestServer::start().await;
    let resp = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn metrics_endpoint_serves_prometheus_text() {
    let server = TestServer::start().await;
    let resp = server.client.get(server.url("/metrics")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let text = resp.text().await.unwrap();
    assert!(text.contains("mock_inflight_requests") || text.is_empty() == false);

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn docs_page_is_served() {
    let server = TestServer::start().await;
    let resp = server.client.get(server.url("/docs")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/html; charset=utf-8"
    );

    server.shutdown().await;
}
