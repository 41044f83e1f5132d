//! Path matcher (spec §4.B): resolves a request path to a registry key,
//! extracting `{var}` template segments along the way.

use std::collections::HashMap;

use crate::scenarios::model::normalize_path;
use crate::scenarios::registry::ScenarioRegistry;

/// Result of a successful path resolution.
pub struct Resolved {
    /// The registry key to look up (`"{template}_{METHOD}"`).
    pub key: String,
    /// Named path variables extracted from `{name}` segments.
    pub vars: HashMap<String, String>,
}

/// Resolves `path` + `method` to a registry key (spec §4.B).
///
/// 1. Exact fast path: O(1) lookup of the literal path.
/// 2. Template slow path: O(#scenarios), first matching template wins
///    (registry iteration order is the tiebreak).
/// 3. `None` if nothing matches — the caller treats this as 404.
#[must_use]
pub fn resolve(registry: &ScenarioRegistry, path: &str, method: &str) -> Option<Resolved> {
    let path = normalize_path(path);
    let method = method.to_uppercase();

    let exact_key = format!("{path}_{method}");
    if registry.lookup(&exact_key).is_some() {
        return Some(Resolved {
            key: exact_key,
            vars: HashMap::new(),
        });
    }

    let mut found: Option<Resolved> = None;
    registry.iterate(|key, _list| {
        if found.is_some() {
            return;
        }
        let Some((template, key_method)) = key.rsplit_once('_') else {
            return;
        };
        if key_method != method || !template.contains('{') {
            return;
        }
        if let Some(vars) = match_template(template, &path) {
            found = Some(Resolved {
                key: key.to_string(),
                vars,
            });
        }
    });

    found
}

/// Matches a `{var}`-templated path against a concrete path, returning the
/// extracted variables on success.
///
/// Segment counts must match; non-template segments must match literally.
/// An empty `{var}` segment is allowed as long as the path segment itself is
/// non-empty (spec §4.B edge cases).
fn match_template(template: &str, path: &str) -> Option<HashMap<String, String>> {
    let tmpl_segments: Vec<&str> = template.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();
    if tmpl_segments.len() != path_segments.len() {
        return None;
    }

    let mut vars = HashMap::new();
    for (t, p) in tmpl_segments.iter().zip(path_segments.iter()) {
        if let Some(name) = t.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            if p.is_empty() {
                return None;
            }
            vars.insert(name.to_string(), (*p).to_string());
        } else if t != p {
            return None;
        }
    }
    Some(vars)
}
