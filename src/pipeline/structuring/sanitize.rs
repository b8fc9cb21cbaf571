// Sanitize schema names before sending them to the generative service.
// The service only accepts [A-Za-z0-9_-] in schema names, at most 64 long.

use std::sync::LazyLock;

use regex::Regex;

static DISALLOWED_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]").unwrap());

/// Longest schema name the service accepts.
pub const MAX_SCHEMA_NAME_LEN: usize = 64;

static UNDERSCORE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").unwrap());

/// Rewrite a free-form name into an identifier the service accepts:
/// disallowed characters become `_`, runs of `_` collapse to one, and
/// leading/trailing `_` are stripped. Idempotent; may map distinct names
/// to the same identifier.
pub fn sanitize_schema_name(name: &str) -> String {
    let replaced = DISALLOWED_CHARS.replace_all(name, "_");
    let collapsed = UNDERSCORE_RUNS.replace_all(&replaced, "_");
    collapsed.trim_matches('_').to_string()
}

/// True if `name` is non-empty, within `MAX_SCHEMA_NAME_LEN`, and only
/// uses the service's schema-name charset.
pub fn is_valid_schema_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_SCHEMA_NAME_LEN && !DISALLOWED_CHARS.is_match(name)
}
