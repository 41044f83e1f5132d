//! Template context for the body template engine (spec §4.F).
//!
//! A closed, sandboxed context: the exposed fields are fixed so that
//! untrusted scenario bodies cannot reach outside the renderer (spec §9,
//! "Template context is a closed struct"). The dotted-path JSON resolver
//! below is adapted from the teacher's `dynamic::context::resolve_json_path`.

use std::collections::HashMap;

use serde_json::Value;

/// `Request` half of the template context (spec §4.F).
pub struct RequestContext {
    pub id: String,
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub path_vars: HashMap<String, String>,
    pub body: Value,
}

/// `Server` half of the template context (spec §4.F).
pub struct ServerContext {
    pub hostname: String,
    pub timestamp: String,
    pub fault_type: String,
}

/// The full closed context exposed to response body templates.
pub struct TemplateContext {
    pub request: RequestContext,
    pub server: ServerContext,
}

impl TemplateContext {
    /// Resolves a dotted path like `Request.Query.q` or `Server.Timestamp`.
    /// Returns `None` when the path does not resolve to a value (the caller
    /// renders missing variables as empty string, per spec §4.F parity with
    /// the teacher's template engine).
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<String> {
        let mut segments = path.splitn(2, '.');
        let root = segments.next()?;
        let rest = segments.next();

        match root {
            "Request" => self.resolve_request(rest),
            "Server" => self.resolve_server(rest),
            _ => None,
        }
    }

    /// Resolves a map lookup for the `index` helper, which exists precisely
    /// because dotted paths can't address keys with special characters
    /// (e.g. `X-Request-ID`).
    #[must_use]
    pub fn index_lookup(&self, container_path: &str, key: &str) -> Option<String> {
        match container_path {
            "Request.Query" => self.request.query.get(key).cloned(),
            "Request.Headers" => self.request.headers.get(key).cloned(),
            "Request.PathVars" => self.request.path_vars.get(key).cloned(),
            "Request.Body" => resolve_json_path(&self.request.body, key),
            _ => None,
        }
    }

    fn resolve_request(&self, rest: Option<&str>) -> Option<String> {
        match rest? {
            "ID" => Some(self.request.id.clone()),
            "Method" => Some(self.request.method.clone()),
            "Path" => Some(self.request.path.clone()),
            p if p.starts_with("Query.") => self.request.query.get(&p[6..]).cloned(),
            p if p.starts_with("Headers.") => self.request.headers.get(&p[8..]).cloned(),
            p if p.starts_with("PathVars.") => self.request.path_vars.get(&p[9..]).cloned(),
            "Body" => Some(json_to_display(&self.request.body)),
            p if p.starts_with("Body.") => resolve_json_path(&self.request.body, &p[5..]),
            _ => None,
        }
    }

    fn resolve_server(&self, rest: Option<&str>) -> Option<String> {
        match rest? {
            "Hostname" => Some(self.server.hostname.clone()),
            "Timestamp" => Some(self.server.timestamp.clone()),
            "FaultType" => Some(self.server.fault_type.clone()),
            _ => None,
        }
    }
}

fn json_to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolves a JSON path like `user.profile.name` or `items[0].id` against a
/// parsed JSON value (teacher precedent: `dynamic::context::resolve_json_path`).
fn resolve_json_path(value: &Value, path: &str) -> Option<String> {
    let mut current = value;
    let segment_re = regex::Regex::new(r"(\w+)|\[(-?\d+)\]").ok()?;

    for cap in segment_re.captures_iter(path) {
        if let Some(key) = cap.get(1) {
            current = current.get(key.as_str())?;
        } else if let Some(idx) = cap.get(2) {
            let index: i64 = idx.as_str().parse().ok()?;
            let arr = current.as_array()?;
            let actual_index = if index < 0 {
                let len = i64::try_from(arr.len()).ok()?;
                if -index > len {
                    return None;
                }
                usize::try_from(len + index).ok()?
            } else {
                usize::try_from(index).ok()?
            };
            current = arr.get(actual_index)?;
        }
    }

    Some(json_to_display(current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> TemplateContext {
        TemplateContext {
            request: RequestContext {
                id: "req-1".into(),
                method: "GET".into(),
                path: "/api/search".into(),
                query: HashMap::from([("q".to_string(), "golang".to_string())]),
                headers: HashMap::from([("X-Request-ID".to_string(), "abc".to_string())]),
                path_vars: HashMap::from([("id".to_string(), "42".to_string())]),
                body: json!({"user": {"name": "ada"}}),
            },
            server: ServerContext {
                hostname: "host-1".into(),
                timestamp: "2026-07-28T00:00:00Z".into(),
                fault_type: "delay".into(),
            },
        }
    }

    #[test]
    fn resolves_request_query() {
        assert_eq!(ctx().get_path("Request.Query.q"), Some("golang".to_string()));
    }

    #[test]
    fn resolves_nested_body_path() {
        assert_eq!(
            ctx().get_path("Request.Body.user.name"),
            Some("ada".to_string())
        );
    }

    #[test]
    fn resolves_path_vars() {
        assert_eq!(ctx().get_path("Request.PathVars.id"), Some("42".to_string()));
    }

    #[test]
    fn resolves_server_fields() {
        assert_eq!(ctx().get_path("Server.Hostname"), Some("host-1".to_string()));
        assert_eq!(ctx().get_path("Server.FaultType"), Some("delay".to_string()));
    }

    #[test]
    fn missing_path_is_none() {
        assert_eq!(ctx().get_path("Request.Query.missing"), None);
    }

    #[test]
    fn index_helper_reaches_special_char_keys() {
        assert_eq!(
            ctx().index_lookup("Request.Headers", "X-Request-ID"),
            Some("abc".to_string())
        );
    }
}
