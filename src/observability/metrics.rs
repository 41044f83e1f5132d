//! Prometheus metrics (spec §6), adapted from the teacher's
//! `observability::metrics`: a one-time recorder install guarded by an
//! `AtomicBool`, `describe_*!` registration up front, then typed `record_*`
//! helpers. Label values derived from request paths are sanitized so an
//! attacker-controlled path can't blow up Prometheus label cardinality.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// The closed set of fault-type labels from spec §6.
const KNOWN_FAULT_TYPES: &[&str] = &["delay", "http_error", "cpu_stress", "memory_stress"];

/// Installs the global Prometheus recorder and registers metric
/// descriptions. Idempotent: a second call is a no-op (useful across
/// integration tests that each start a server in-process).
///
/// The returned/retained handle backs the built-in `GET /metrics` route
/// (spec §6); faultline does not run a second standalone metrics listener.
pub fn init_metrics() -> crate::error::Result<()> {
    if METRICS_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| crate::error::Error::Config(format!("failed to install metrics recorder: {e}")))?;
    let _ = PROMETHEUS_HANDLE.set(handle);

    describe_metrics();
    Ok(())
}

/// Renders the current Prometheus exposition text for `GET /metrics`.
/// Empty before `init_metrics` has run.
#[must_use]
pub fn render() -> String {
    PROMETHEUS_HANDLE.get().map(PrometheusHandle::render).unwrap_or_default()
}

/// The axum route handler for `GET /metrics`.
pub async fn handle() -> String {
    render()
}

fn describe_metrics() {
    metrics::describe_counter!(
        "mock_faults_injected_total",
        "Count of faults injected, labeled by fault type and path"
    );
    metrics::describe_gauge!(
        "mock_inflight_requests",
        "Number of requests currently being handled"
    );
    metrics::describe_histogram!(
        "mock_response_duration_seconds",
        "Response latency in seconds, labeled by path, method, and status"
    );
}

/// Records a fault injection event (spec §6's fault metric labels).
/// `fault_type` outside the known set is bucketed to `"other"` to bound
/// cardinality from attacker-controlled input.
pub fn record_fault(fault_type: &str, path: &str) {
    let fault_type = sanitize_fault_type(fault_type);
    let path = sanitize_path_label(path);
    metrics::counter!(
        "mock_faults_injected_total",
        "type" => fault_type,
        "path" => path,
    )
    .increment(1);
}

/// Sets the in-flight request gauge (spec §6). Incremented on request entry,
/// decremented on completion — see `middleware::track`.
pub fn set_inflight(count: i64) {
    metrics::gauge!("mock_inflight_requests").set(count as f64);
}

pub fn increment_inflight() {
    metrics::gauge!("mock_inflight_requests").increment(1.0);
}

pub fn decrement_inflight() {
    metrics::gauge!("mock_inflight_requests").decrement(1.0);
}

/// Records one request's latency, labeled by (path, method, status) per
/// spec §6.
pub fn record_response_duration(path: &str, method: &str, status: u16, seconds: f64) {
    let path = sanitize_path_label(path);
    metrics::histogram!(
        "mock_response_duration_seconds",
        "path" => path,
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .record(seconds);
}

fn sanitize_fault_type(fault_type: &str) -> &'static str {
    KNOWN_FAULT_TYPES
        .iter()
        .find(|&&known| known == fault_type)
        .copied()
        .unwrap_or("other")
}

/// Bounds label cardinality from attacker-controlled paths: truncates long
/// paths and collapses template variables, mirroring the teacher's
/// `sanitize_method_label` truncate-and-allowlist approach.
fn sanitize_path_label(path: &str) -> String {
    const MAX_LEN: usize = 128;
    if path.len() <= MAX_LEN {
        path.to_string()
    } else {
        format!("{}...", &path[..MAX_LEN])
    }
}
