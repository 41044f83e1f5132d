//! `GET /sse` (spec §6): a ticking event stream, read directly off the
//! response body without a dedicated SSE client crate.

mod common;

use futures_util::StreamExt;

use common::TestServer;

#[tokio::test(flavor = "multi_thread")]
async fn sse_emits_a_time_tick_event() {
    let server = TestServer::start().await;
    let resp = server.client.get(server.url("/sse")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let mut stream = resp.bytes_stream();
    let chunk = tokio::time::timeout(std::time::Duration::from_secs(5), stream.next())
        .await
        .expect("timed out waiting for an SSE tick")
        .expect("stream ended before any tick")
        .expect("SSE chunk read error");

    let text = String::from_utf8_lossy(&chunk);
    assert!(text.contains("The time is"), "unexpected SSE payload: {text}");

    server.shutdown().await;
}
