//! Scenario-file schema (spec §6) and server-wide settings (`SPEC_FULL.md` §3
//! "Server-wide configuration").
//!
//! Mirrors the teacher's `config::schema` conventions (`#[serde(default)]`
//! on every optional field) but the actual shape is faultline's own: a flat
//! list of scenario bindings, not a tool/resource/prompt library.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::breaker::BreakerConfig;
use crate::error::{Error, Result};
use crate::scenarios::model::{DelayRange, MatchSpec, Response, Scenario};

/// Top-level scenario file: a bare array of scenario bindings (spec §6).
pub type ScenarioFile = Vec<ScenarioDef>;

/// One scenario as it appears in the YAML file or a `POST /scenario` body.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioDef {
    pub path: String,
    pub method: String,
    #[serde(default)]
    pub matches: MatchSpec,
    pub responses: Vec<ResponseDef>,
    #[serde(default, alias = "circuitBreaker")]
    pub circuit_breaker: Option<BreakerConfig>,
}

/// One response in a scenario's `responses` list, as it appears on the wire.
///
/// `body` accepts either a JSON-encoded string (stored verbatim) or a
/// structured YAML value (marshaled to JSON text) per spec §6.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseDef {
    pub status: u16,
    #[serde(default, with = "humantime_serde::option")]
    pub delay: Option<Duration>,
    #[serde(default, alias = "delayRange")]
    pub delay_range: Option<DelayRange>,
    #[serde(default)]
    pub body: Option<serde_yaml::Value>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub gzip: bool,
    #[serde(default)]
    pub probability: f64,
}

impl ScenarioDef {
    /// Converts this wire definition into a runtime [`Scenario`], rejecting
    /// the three invalid shapes called out in spec §4.A ("adding an invalid
    /// scenario... is rejected at the control-API boundary").
    pub fn into_scenario(self) -> Result<Scenario> {
        if self.path.is_empty() {
            return Err(Error::InvalidScenario("path must not be empty".into()));
        }
        if self.method.is_empty() {
            return Err(Error::InvalidScenario("method must not be empty".into()));
        }
        if self.responses.is_empty() {
            return Err(Error::InvalidScenario(
                "responses must contain at least one entry".into(),
            ));
        }

        let responses = self
            .responses
            .into_iter()
            .map(ResponseDef::into_response)
            .collect::<Result<Vec<_>>>()?;

        Ok(Scenario::new(
            self.path,
            self.method,
            self.matches,
            responses,
            self.circuit_breaker,
        ))
    }
}

impl ResponseDef {
    fn into_response(self) -> Result<Response> {
        let body = match self.body {
            None => String::new(),
            Some(serde_yaml::Value::String(s)) => s,
            Some(other) => {
                let json = yaml_to_json(other);
                serde_json::to_string(&json).map_err(Error::Json)?
            }
        };

        Ok(Response {
            status: self.status,
            delay: self.delay,
            delay_range: self.delay_range,
            body,
            headers: self.headers,
            gzip: self.gzip,
            probability: self.probability,
        })
    }
}

/// Converts a `serde_yaml::Value` to `serde_json::Value` so structured YAML
/// response bodies can be marshaled to JSON text (spec §6).
fn yaml_to_json(value: serde_yaml::Value) -> serde_json::Value {
    match value {
        serde_yaml::Value::Null => serde_json::Value::Null,
        serde_yaml::Value::Bool(b) => serde_json::Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_json::Value::from(i)
            } else if let Some(u) = n.as_u64() {
                serde_json::Value::from(u)
            } else {
                serde_json::Number::from_f64(n.as_f64().unwrap_or(0.0))
                    .map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
        }
        serde_yaml::Value::String(s) => serde_json::Value::String(s),
        serde_yaml::Value::Sequence(seq) => {
            serde_json::Value::Array(seq.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(map) => {
            let mut obj = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s,
                    other => serde_yaml::to_string(&other).unwrap_or_default(),
                };
                obj.insert(key, yaml_to_json(v));
            }
            serde_json::Value::Object(obj)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

/// Server-wide settings, constructed once at startup from the environment
/// (`SPEC_FULL.md` §3) and shared via `Arc`. Mirrors the teacher's
/// `ConfigLimits` "env-or-default" pattern of reading each knob with a
/// typed fallback.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub port: u16,
    pub enable_tls: bool,
    pub cert_file: Option<String>,
    pub key_file: Option<String>,
    pub enable_cors: bool,
    pub log_requests: bool,
    pub log_headers: bool,
    pub log_body: bool,
    pub max_body_size: usize,
    pub rate_limit_rps: u32,
    pub history_size: usize,
    pub echo_delay: Duration,
    pub echo_chaos_probability: f64,
}

impl ServerSettings {
    /// Reads every knob from the environment, falling back to the defaults
    /// from spec §5/§6 when a variable is absent or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_parsed("PORT", 8080),
            enable_tls: env_bool("ENABLE_TLS", false),
            cert_file: std::env::var("CERT_FILE").ok(),
            key_file: std::env::var("KEY_FILE").ok(),
            enable_cors: env_bool("ENABLE_CORS", false),
            log_requests: env_bool("LOG_REQUESTS", true),
            log_headers: env_bool("LOG_HEADERS", false),
            log_body: env_bool("LOG_BODY", false),
            max_body_size: env_parsed("MAX_BODY_SIZE", 1024 * 1024),
            rate_limit_rps: env_parsed("RATE_LIMIT_RPS", 0),
            history_size: env_parsed("HISTORY_SIZE", 100),
            echo_delay: Duration::from_millis(env_parsed("ECHO_DELAY", 0)),
            echo_chaos_probability: env_parsed("ECHO_CHAOS_PROBABILITY", 0.0),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_path() {
        let def = ScenarioDef {
            path: String::new(),
            method: "GET".into(),
            matches: MatchSpec::default(),
            responses: vec![ResponseDef {
                status: 200,
                delay: None,
                delay_range: None,
                body: None,
                headers: HashMap::new(),
                gzip: false,
                probability: 0.0,
            }],
            circuit_breaker: None,
        };
        assert!(def.into_scenario().is_err());
    }

    #[test]
    fn rejects_empty_responses() {
        let def = ScenarioDef {
            path: "/a".into(),
            method: "GET".into(),
            matches: MatchSpec::default(),
            responses: vec![],
            circuit_breaker: None,
        };
        assert!(def.into_scenario().is_err());
    }

    #[test]
    fn structured_body_is_marshaled_to_json_text() {
        let def = ScenarioDef {
            path: "/a".into(),
            method: "GET".into(),
            matches: MatchSpec::default(),
            responses: vec![ResponseDef {
                status: 200,
                delay: None,
                delay_range: None,
                body: Some(serde_yaml::from_str("key: value").unwrap()),
                headers: HashMap::new(),
                gzip: false,
                probability: 0.0,
            }],
            circuit_breaker: None,
        };
        let scenario = def.into_scenario().unwrap();
        assert_eq!(scenario.responses[0].body, r#"{"key":"value"}"#);
    }

    #[test]
    fn string_body_is_kept_verbatim() {
        let def = ScenarioDef {
            path: "/a".into(),
            method: "GET".into(),
            matches: MatchSpec::default(),
            responses: vec![ResponseDef {
                status: 200,
                delay: None,
                delay_range: None,
                body: Some(serde_yaml::Value::String(
                    r#"{"query":"{{.Request.Query.q}}"}"#.into(),
                )),
                headers: HashMap::new(),
                gzip: false,
                probability: 0.0,
            }],
            circuit_breaker: None,
        };
        let scenario = def.into_scenario().unwrap();
        assert_eq!(
            scenario.responses[0].body,
            r#"{"query":"{{.Request.Query.q}}"}"#
        );
    }
}
