//! Scenario and Response data model (spec §3, §4.A).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::breaker::{Breaker, BreakerConfig};

/// Predicates a scenario may require of an incoming request (spec §4.C).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchSpec {
    /// Header name → required exact value (first value wins on multi-valued headers).
    #[serde(default)]
    pub headers: std::collections::HashMap<String, String>,

    /// Query parameter name → required exact value.
    #[serde(default)]
    pub query: std::collections::HashMap<String, String>,

    /// Body predicate: `/regex/`, `regex:<pattern>`, or a plain substring.
    #[serde(default)]
    pub body: Option<String>,
}

impl MatchSpec {
    /// Whether this spec has no predicates at all (always matches).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.query.is_empty() && self.body.is_none()
    }
}

/// One entry in a scenario's rotating response list (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code to serve.
    pub status: u16,

    /// Fixed delay before serving the response.
    #[serde(default, with = "humantime_serde")]
    pub delay: Option<Duration>,

    /// Inclusive `[min, max]` random delay range; takes precedence over `delay`.
    #[serde(default)]
    pub delay_range: Option<DelayRange>,

    /// Raw response body, possibly containing `{{ }}` template markers.
    #[serde(default)]
    pub body: String,

    /// Extra response headers.
    #[serde(default)]
    pub headers: std::collections::HashMap<String, String>,

    /// Whether to gzip-encode the rendered body.
    #[serde(default)]
    pub gzip: bool,

    /// Probability this response fires once selected; 0 or >=1 means always.
    #[serde(default)]
    pub probability: f64,
}

/// An inclusive `[min, max]` delay range, e.g. `{min: 100ms, max: 2s}` in YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayRange {
    #[serde(with = "humantime_serde")]
    pub min: Duration,
    #[serde(with = "humantime_serde")]
    pub max: Duration,
}

impl Response {
    /// Resolves the delay to apply for this response, honoring `delay_range`
    /// over `delay` per spec §3 ("takes precedence").
    pub fn resolve_delay(&self) -> Option<Duration> {
        if let Some(range) = &self.delay_range {
            if range.max <= range.min {
                return Some(range.min);
            }
            let span = range.max.saturating_sub(range.min).as_nanos().max(1);
            let offset = u128::from(rand::random::<u64>()) % span;
            return Some(range.min + Duration::from_nanos(offset as u64));
        }
        self.delay
    }

    /// Whether the probability gate should admit this response this time.
    ///
    /// Per spec §4.D: 0 or >=1 means always fire; values in between are a
    /// probability threshold, compared against a fresh uniform draw.
    #[must_use]
    pub fn probability_admits(&self) -> bool {
        if self.probability <= 0.0 || self.probability >= 1.0 {
            return true;
        }
        rand::random::<f64>() <= self.probability
    }
}

/// A named binding from (path-template, method) to behavior (spec §3).
#[derive(Debug)]
pub struct Scenario {
    /// Path template, may contain `{var}` segments.
    pub path: String,
    /// Uppercase HTTP verb.
    pub method: String,
    /// Optional request predicates.
    pub matches: MatchSpec,
    /// Ordered, non-empty list of candidate responses.
    pub responses: Vec<Response>,
    /// Rotating cursor into `responses`. Advisory, not transactional (spec §5).
    index: AtomicUsize,
    /// Per-scenario circuit breaker, armed only when configured.
    pub breaker: Option<Breaker>,
}

impl Scenario {
    /// Builds a runtime `Scenario` from a deserialized definition.
    #[must_use]
    pub fn new(
        path: String,
        method: String,
        matches: MatchSpec,
        responses: Vec<Response>,
        breaker_config: Option<BreakerConfig>,
    ) -> Self {
        Self {
            path,
            method: method.to_uppercase(),
            matches,
            responses,
            index: AtomicUsize::new(0),
            breaker: breaker_config.map(Breaker::new),
        }
    }

    /// The registry key for this scenario: `"{path}_{METHOD}"` (spec §3).
    #[must_use]
    pub fn key(&self) -> String {
        key_for(&self.path, &self.method)
    }

    /// Atomically advances the cursor and returns the response to use for
    /// *this* request along with the index it was read at.
    ///
    /// Two concurrent callers may observe the same index; this is the
    /// documented, acceptable race from spec §4.D / §5.
    pub fn next_response(&self) -> (usize, &Response) {
        let len = self.responses.len();
        let idx = self.index.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
            Some((v + 1) % len)
        });
        let idx = idx.unwrap_or(0);
        (idx, &self.responses[idx])
    }

    /// Current cursor value without advancing it (test/inspection helper).
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.index.load(Ordering::SeqCst) % self.responses.len().max(1)
    }
}

/// Builds the registry key `"{path}_{METHOD}"` used throughout the registry
/// and path matcher (spec §3, §4.B).
#[must_use]
pub fn key_for(path: &str, method: &str) -> String {
    format!("{}_{}", normalize_path(path), method.to_uppercase())
}

/// Normalizes trailing slashes so `/a/` and `/a` key identically (spec §4.B).
#[must_use]
pub fn normalize_path(path: &str) -> String {
    if path.len() > 1 && path.ends_with('/') {
        path.trim_end_matches('/').to_string()
    } else {
        path.to_string()
    }
}
