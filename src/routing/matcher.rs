//! Request matcher (spec §4.C): tests a scenario's predicates against an
//! incoming request. Body-pattern compilation follows the teacher's
//! `dynamic::matching::compile_single_string` convention — `regex:`-prefixed
//! or `/.../`-wrapped patterns compile as size-limited regexes (preventing
//! compile-time DoS from attacker-controlled scenario config), everything
//! else is a plain substring test.

use std::collections::HashMap;

use regex::RegexBuilder;

use crate::scenarios::model::MatchSpec;

/// Maximum compiled-regex program size, mirroring the teacher's 1 MiB cap.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// A compiled body predicate.
enum BodyPattern {
    Regex(regex::Regex),
    Substring(String),
}

impl BodyPattern {
    fn compile(pattern: &str) -> Self {
        let regex_source = pattern
            .strip_prefix("regex:")
            .or_else(|| pattern.strip_prefix('/').and_then(|s| s.strip_suffix('/')));

        if let Some(source) = regex_source {
            match RegexBuilder::new(source).size_limit(REGEX_SIZE_LIMIT).build() {
                Ok(re) => return Self::Regex(re),
                Err(_) => return Self::Substring(pattern.to_string()),
            }
        }
        Self::Substring(pattern.to_string())
    }

    fn matches(&self, body: &str) -> bool {
        match self {
            Self::Regex(re) => re.is_match(body),
            Self::Substring(needle) => body.contains(needle.as_str()),
        }
    }
}

/// Request facts the matcher needs, decoupled from any particular web framework.
pub struct RequestFacts<'a> {
    /// First value per header name, lower-cased keys.
    pub headers: &'a HashMap<String, String>,
    /// First value per query parameter name.
    pub query: &'a HashMap<String, String>,
    /// Raw request body, already bounded by the global max-body size (spec §4.C).
    pub body: &'a [u8],
}

/// Tests whether `matches` is satisfied by `req` (spec §4.C).
///
/// A scenario with no predicates matches every request for its key.
#[must_use]
pub fn matches(spec: &MatchSpec, req: &RequestFacts<'_>) -> bool {
    for (h, v) in &spec.headers {
        let Some(actual) = req.headers.get(&h.to_lowercase()) else {
            return false;
        };
        if actual != v {
            return false;
        }
    }

    for (q, v) in &spec.query {
        if req.query.get(q) != Some(v) {
            return false;
        }
    }

    if let Some(pattern) = &spec.body {
        if pattern.is_empty() {
            return true;
        }
        let body_str = String::from_utf8_lossy(req.body);
        let compiled = BodyPattern::compile(pattern);
        if !compiled.matches(&body_str) {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts<'a>(
        headers: &'a HashMap<String, String>,
        query: &'a HashMap<String, String>,
        body: &'a [u8],
    ) -> RequestFacts<'a> {
        RequestFacts { headers, query, body }
    }

    #[test]
    fn empty_spec_matches_everything() {
        let spec = MatchSpec::default();
        let h = HashMap::new();
        let q = HashMap::new();
        assert!(matches(&spec, &facts(&h, &q, b"")));
    }

    #[test]
    fn header_exact_match_required() {
        let mut spec = MatchSpec::default();
        spec.headers.insert("x-test".into(), "A".into());
        let mut h = HashMap::new();
        h.insert("x-test".into(), "A".into());
        let q = HashMap::new();
        assert!(matches(&spec, &facts(&h, &q, b"")));

        h.insert("x-test".into(), "B".into());
        assert!(!matches(&spec, &facts(&h, &q, b"")));
    }

    #[test]
    fn query_exact_match_required() {
        let mut spec = MatchSpec::default();
        spec.query.insert("type".into(), "B".into());
        let h = HashMap::new();
        let mut q = HashMap::new();
        q.insert("type".into(), "B".into());
        assert!(matches(&spec, &facts(&h, &q, b"")));
        q.insert("type".into(), "C".into());
        assert!(!matches(&spec, &facts(&h, &q, b"")));
    }

    #[test]
    fn body_regex_slash_form() {
        let mut spec = MatchSpec::default();
        spec.body = Some("/^START.*END$/".into());
        let h = HashMap::new();
        let q = HashMap::new();
        assert!(matches(&spec, &facts(&h, &q, b"START middle END")));
        assert!(!matches(&spec, &facts(&h, &q, b"nope")));
    }

    #[test]
    fn body_regex_prefixed_form() {
        let mut spec = MatchSpec::default();
        spec.body = Some("regex:(?i)hello".into());
        let h = HashMap::new();
        let q = HashMap::new();
        assert!(matches(&spec, &facts(&h, &q, b"HELLO world")));
    }

    #[test]
    fn body_substring_fallback() {
        let mut spec = MatchSpec::default();
        spec.body = Some("needle".into());
        let h = HashMap::new();
        let q = HashMap::new();
        assert!(matches(&spec, &facts(&h, &q, b"a needle in haystack")));
        assert!(!matches(&spec, &facts(&h, &q, b"nothing here")));
    }
}
