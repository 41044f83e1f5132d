//! Circuit breaker end-to-end behavior, spec §8 E2 and invariants 2-4.

mod common;

use serde_json::json;

use common::TestServer;

#[tokio::test(flavor = "multi_thread")]
async fn e2_breaker_trips_then_recovers_through_half_open() {
    let server = TestServer::start().await;
    // Breaker opens on request 3 before the third response is ever consumed
    // (admit() gates ahead of the cursor advance), so the deferred 200 is
    // exactly what the half-open probe picks up once the timeout elapses —
    // no separate "mutate the response" step needed.
    server
        .register(json!({
            "path": "/test-cb",
            "method": "GET",
            "responses": [{"status": 500}, {"status": 500}, {"status": 200}],
            "circuitBreaker": {
                "failureThreshold": 2,
                "successThreshold": 1,
                "timeout": "100ms",
            },
        }))
        .await;

    let first = server.client.get(server.url("/test-cb")).send().await.unwrap();
    assert_eq!(first.status(), 500);
    let second = server.client.get(server.url("/test-cb")).send().await.unwrap();
    assert_eq!(second.status(), 500);

    // Breaker open: short-circuits with 503 and does not advance the cursor.
    let third = server.client.get(server.url("/test-cb")).send().await.unwrap();
    assert_eq!(third.status(), 503);

    tokio::time::sleep(std::time::Duration::from_millis(150)).await;

    let fourth = server.client.get(server.url("/test-cb")).send().await.unwrap();
    assert_eq!(fourth.status(), 200, "half-open probe should serve the un-consumed third response");

    server.shutdown().await;
}

/// Invariant 2: under the failure threshold, the breaker never short-circuits.
#[tokio::test(flavor = "multi_thread")]
async fn breaker_closed_below_threshold_never_short_circuits() {
    let server = TestServer::start().await;
    server
        .register(json!({
            "path": "/flaky",
            "method": "GET",
            "responses": [{"status": 500}],
            "circuitBreaker": {
                "failureThreshold": 5,
                "successThreshold": 1,
                "timeout": "1s",
            },
        }))
        .await;

    for _ in 0..4 {
        let resp = server.client.get(server.url("/flaky")).send().await.unwrap();
        assert_eq!(resp.status(), 500, "below threshold, breaker must pass failures through");
    }

    server.shutdown().await;
}
