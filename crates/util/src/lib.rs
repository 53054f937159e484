//! Request-time helpers for Restbench: routing form values into a request,
//! applying credentials, validating input, interpolating environment
//! variables and dispatching over HTTP.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub mod auth;
pub mod http_exec;
pub mod http_path_resolution;
pub mod interpolation;
pub mod routing;
pub mod validation;

pub use auth::apply_auth;
pub use http_exec::{DispatchError, DispatchOutcome, dispatch};
pub use interpolation::{find_variables, resolve_assembly_variables, resolve_value_variables, resolve_variables};
pub use routing::route;
pub use validation::{ValidationReport, validate_fields, visible_fields};

static SENSITIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)("?authorization"?\s*[:=]\s*"?(?:bearer\s+)?)[^\s",]+"#,
        r#"(?i)("?cookie"?\s*[:=]\s*"?[^=\s"]+=)[^;\s",]+"#,
        r#"(?i)("?[\w-]*(?:key|token|secret|password)"?\s*[:=]\s*"?)[^\s",&]+"#,
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("redaction regex should compile"))
    .collect()
});

/// Redacts values that look like credentials: authorization headers, cookies
/// and `*key`/`*token`/`*secret`/`*password` assignments in headers, JSON or
/// query strings.
pub fn redact_sensitive(input: &str) -> String {
    SENSITIVE_PATTERNS.iter().fold(input.to_string(), |redacted, pattern| {
        pattern
            .replace_all(&redacted, |caps: &Captures| format!("{}<redacted>", &caps[1]))
            .into_owned()
    })
}
