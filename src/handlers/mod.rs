//! Route handlers: the catch-all scenario dispatcher plus the built-in
//! endpoints (control API, echo, stress, health, streaming, static pages).
//! `AppState` is the single `Arc<...>` threaded through all of them via
//! `axum::extract::State`.

pub mod control;
pub mod dispatch;
pub mod echo;
pub mod health;
pub mod static_pages;
pub mod streaming;
pub mod stress;

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::config::schema::ServerSettings;
use crate::history::HistoryBuffer;
use crate::scenarios::registry::ScenarioRegistry;

/// Shared application state threaded through every route handler.
pub struct AppState {
    pub registry: Arc<ScenarioRegistry>,
    pub history: Arc<HistoryBuffer>,
    pub settings: Arc<ServerSettings>,
    pub started_at: Instant,
    pub hostname: String,
    pub http_client: reqwest::Client,
    pub faults_injected: AtomicU64,
    pub shutdown: CancellationToken,
}

impl AppState {
    #[must_use]
    pub fn new(
        registry: Arc<ScenarioRegistry>,
        history: Arc<HistoryBuffer>,
        settings: Arc<ServerSettings>,
        shutdown: CancellationToken,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            registry,
            history,
            settings,
            started_at: Instant::now(),
            hostname: std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string()),
            http_client,
            faults_injected: AtomicU64::new(0),
            shutdown,
        }
    }

    /// Records a fault both in the in-process counter surfaced by
    /// `reset-metrics` and in the exported Prometheus metric.
    pub fn record_fault(&self, fault_type: &str, path: &str) {
        self.faults_injected.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        crate::observability::metrics::record_fault(fault_type, path);
    }
}
