//! Shared integration-test harness: spawns a `faultline` server as a child
//! process on an OS-assigned port and exposes a `reqwest` client against it.

#![allow(dead_code)]

use std::process::Stdio;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

/// Default timeout for server startup and request round-trips.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A running `faultline` server process with a client pre-wired to its base URL.
pub struct TestServer {
    child: Child,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Spawns `faultline serve --port 0` and waits for its bound address to
    /// appear on stderr (mirrors the teacher's `tests/test_http_transport.rs`
    /// "read stderr until the listening line" approach).
    pub async fn start() -> Self {
        let bin = env!("CARGO_BIN_EXE_faultline");
        let mut child = Command::new(bin)
            .args(["serve", "--port", "0", "-v"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .expect("failed to spawn faultline");

        let stderr = child.stderr.take().expect("stderr not captured");
        let mut reader = BufReader::new(stderr);
        let mut line = String::new();
        let mut port: Option<u16> = None;

        let deadline = tokio::time::Instant::now() + DEFAULT_TIMEOUT;
        while tokio::time::Instant::now() < deadline {
            line.clear();
            let n = tokio::time::timeout(Duration::from_secs(5), reader.read_line(&mut line))
                .await
                .expect("timed out waiting for faultline startup")
                .expect("failed to read stderr");
            assert!(n > 0, "server exited before printing its listening address");

            if line.contains("listening") {
                if let Some(at) = line.rfind(':') {
                    let tail: String = line[at + 1..]
                        .chars()
                        .take_while(char::is_ascii_digit)
                        .collect();
                    port = tail.parse().ok();
                }
                break;
            }
        }

        let port = port.expect("failed to discover bound port from stderr");
        let base_url = format!("http://127.0.0.1:{port}");
        let client = reqwest::Client::new();

        Self { child, base_url, client }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Registers one scenario via the control API; panics on a non-200.
    pub async fn register(&self, scenario: Value) {
        let resp = self
            .client
            .post(self.url("/scenario"))
            .json(&scenario)
            .send()
            .await
            .expect("failed to POST /scenario");
        assert_eq!(
            resp.status(),
            200,
            "scenario registration failed: {}",
            resp.text().await.unwrap_or_default()
        );
    }

    pub async fn shutdown(mut self) {
        let _ = self.child.kill().await;
    }
}

/// A minimal single-response scenario definition.
pub fn scenario(path: &str, method: &str, response: Value) -> Value {
    json!({
        "path": path,
        "method": method,
        "responses": [response],
    })
}
