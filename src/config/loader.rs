//! Scenario-file loading (spec §6): read → environment substitution → parse
//! → validate → build runtime [`Scenario`](crate::scenarios::model::Scenario)s.
//!
//! Keeps the teacher's `config::loader` shape (read raw text, substitute
//! `${VAR}` references before handing the text to the YAML parser, then
//! deserialize) but drops the `$include`/`$file`/`$generate` directive
//! machinery, which has no counterpart in a flat scenario list.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::schema::ScenarioFile;
use crate::error::{Error, Result};
use crate::scenarios::model::Scenario;

/// Loads and parses the scenario file at `path`.
///
/// A missing file is logged at `warn` and treated as an empty scenario list
/// (spec §6: "Missing file is logged, not fatal; server proceeds with no
/// preloaded scenarios."). A present-but-invalid file is a hard error.
pub fn load_scenarios(path: &Path) -> Result<Vec<Scenario>> {
    if !path.exists() {
        tracing::warn!(
            path = %path.display(),
            "scenario file not found; starting with no preloaded scenarios"
        );
        return Ok(Vec::new());
    }

    let raw = std::fs::read_to_string(path)?;
    let substituted = substitute_env(&raw)?;
    let defs: ScenarioFile = serde_yaml::from_str(&substituted)?;

    defs.into_iter().map(|d| d.into_scenario()).collect()
}

/// Matches `${VAR}`, `${VAR:-default}`, and `${VAR:?message}`. A literal `$`
/// is escaped as `$$` and passes through untouched.
static ENV_VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\$|\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*)|:\?([^}]*))?\}").expect("valid regex")
});

/// Substitutes `${VAR}`-style references in `text` against the process
/// environment, following the teacher's `EnvSubstitution` three-form
/// grammar (plain, default-on-missing, required-or-error).
fn substitute_env(text: &str) -> Result<String> {
    let mut err: Option<Error> = None;
    let result = ENV_VAR_RE.replace_all(text, |caps: &regex::Captures<'_>| {
        if err.is_some() {
            return String::new();
        }
        if caps.get(0).map(|m| m.as_str()) == Some("$$") {
            return "$".to_string();
        }
        let name = &caps[1];
        match std::env::var(name) {
            Ok(value) => value,
            Err(_) => {
                if let Some(default) = caps.get(3) {
                    default.as_str().to_string()
                } else if let Some(message) = caps.get(4) {
                    err = Some(Error::Config(format!(
                        "required environment variable {name} is not set: {}",
                        message.as_str()
                    )));
                    String::new()
                } else {
                    String::new()
                }
            }
        }
    });

    match err {
        Some(e) => Err(e),
        None => Ok(result.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_returns_empty_list() {
        let result = load_scenarios(Path::new("/nonexistent/scenarios.yaml")).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn loads_a_minimal_scenario_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "- path: /api/test\n  method: GET\n  responses:\n    - status: 200\n"
        )
        .unwrap();
        let scenarios = load_scenarios(file.path()).unwrap();
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].path, "/api/test");
    }

    #[test]
    fn invalid_scenario_in_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "- path: /api/test\n  method: GET\n  responses: []\n").unwrap();
        assert!(load_scenarios(file.path()).is_err());
    }

    #[test]
    #[allow(unsafe_code)]
    fn substitutes_plain_var() {
        unsafe {
            std::env::set_var("FAULTLINE_TEST_VAR_A", "hello");
        }
        assert_eq!(substitute_env("x: ${FAULTLINE_TEST_VAR_A}").unwrap(), "x: hello");
        unsafe {
            std::env::remove_var("FAULTLINE_TEST_VAR_A");
        }
    }

    #[test]
    fn falls_back_to_default_when_unset() {
        assert_eq!(
            substitute_env("x: ${FAULTLINE_TEST_VAR_MISSING:-fallback}").unwrap(),
            "x: fallback"
        );
    }

    #[test]
    fn required_var_missing_is_an_error() {
        assert!(substitute_env("x: ${FAULTLINE_TEST_VAR_MISSING:?must be set}").is_err());
    }

    #[test]
    fn escaped_dollar_passes_through() {
        assert_eq!(substitute_env("price: $$5").unwrap(), "price: $5");
    }
}
