//! Body template engine (spec §4.F): single-pass `{{ }}` substitution over
//! a closed [`TemplateContext`]. Adapted from the teacher's
//! `dynamic::template` — one regex pass over the raw body, no recursive
//! re-interpolation of substituted values (so a response body can never
//! template-inject itself).

use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use regex::Regex;

use super::context::TemplateContext;
use crate::error::{Error, Result};

/// Regex for matching `{{ ... }}` template expressions.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(.*?)\s*\}\}").expect("valid regex"));

/// Renders `body`, substituting every `{{ ... }}` token exactly once.
///
/// Unknown variable paths render as an empty string (teacher precedent:
/// missing tool/resource args did the same). Malformed function calls
/// (unknown function name, non-numeric arithmetic argument) are a render
/// error, which the caller turns into a 500 response (spec §4.F).
pub fn render(body: &str, ctx: &TemplateContext) -> Result<String> {
    let mut err: Option<Error> = None;
    let rendered = TOKEN_RE.replace_all(body, |caps: &regex::Captures<'_>| {
        if err.is_some() {
            return String::new();
        }
        match eval_expr(&caps[1], ctx) {
            Ok(value) => value,
            Err(e) => {
                err = Some(e);
                String::new()
            }
        }
    });

    match err {
        Some(e) => Err(e),
        None => Ok(rendered.into_owned()),
    }
}

/// Returns `true` if the string contains any `{{...}}` template expressions.
#[must_use]
pub fn has_templates(s: &str) -> bool {
    TOKEN_RE.is_match(s)
}

fn eval_expr(expr: &str, ctx: &TemplateContext) -> Result<String> {
    let mut tokens = expr.split_whitespace();
    let Some(head) = tokens.next() else {
        return Ok(String::new());
    };
    let args: Vec<&str> = tokens.collect();

    if args.is_empty() {
        return match head {
            "uuid" => Ok(synthetic_id()),
            _ => Ok(resolve_variable(head, ctx)),
        };
    }

    match head {
        "randomInt" => {
            let [min, max] = parse_i64_args(&args)?;
            if min > max {
                return Err(Error::Template(format!(
                    "randomInt: min {min} greater than max {max}"
                )));
            }
            Ok(rand::thread_rng().gen_range(min..=max).to_string())
        }
        "add" => {
            let [a, b] = parse_i64_args(&args)?;
            Ok((a + b).to_string())
        }
        "subtract" => {
            let [a, b] = parse_i64_args(&args)?;
            Ok((a - b).to_string())
        }
        "index" => {
            if args.len() != 2 {
                return Err(Error::Template("index: expected 2 arguments".into()));
            }
            let container = strip_leading_dot(args[0]);
            let key = args[1].trim_matches('"');
            Ok(ctx.index_lookup(container, key).unwrap_or_default())
        }
        other => Err(Error::Template(format!("unknown template function: {other}"))),
    }
}

fn parse_i64_args(args: &[&str]) -> Result<[i64; 2]> {
    if args.len() != 2 {
        return Err(Error::Template("expected exactly 2 numeric arguments".into()));
    }
    let parse_one = |raw: &str| -> Result<i64> {
        if raw.starts_with('.') {
            return Err(Error::Template(format!(
                "numeric argument '{raw}' must be a literal integer, not a variable path"
            )));
        }
        raw.parse::<i64>()
            .map_err(|_| Error::Template(format!("'{raw}' is not an integer")))
    };
    Ok([parse_one(args[0])?, parse_one(args[1])?])
}

fn resolve_variable(token: &str, ctx: &TemplateContext) -> String {
    let path = strip_leading_dot(token);
    ctx.get_path(path).unwrap_or_default()
}

fn strip_leading_dot(token: &str) -> &str {
    token.strip_prefix('.').unwrap_or(token)
}

/// An id-like string derived from the high-resolution clock plus a random
/// suffix. Not a real UUID: the spec only promises "an id-like string".
fn synthetic_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let suffix: u32 = rand::thread_rng().gen();
    format!("{nanos:x}-{suffix:08x}")
}
