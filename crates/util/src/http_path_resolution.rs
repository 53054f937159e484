//! Endpoint template helpers: placeholder substitution and query assembly.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything except RFC 3986 unreserved bytes (`A-Z a-z 0-9 - . _ ~`).
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encodes a path segment or query component, keeping unreserved
/// bytes as-is and emitting uppercase hex for the rest.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Replaces every literal `{name}` in `template` with the encoded `value`.
/// Leaves the template untouched when the placeholder is absent.
pub fn substitute_placeholder(template: &str, name: &str, value: &str) -> String {
    let needle = format!("{{{name}}}");
    if !template.contains(&needle) {
        return template.to_string();
    }
    template.replace(&needle, &encode_component(value))
}

/// Drops bare keys (`?active`, `&flag`) from a template's query string.
///
/// A bare key marks a query slot that a field may fill; it carries no value
/// of its own. Pairs with `=` are fixed values and stay in place.
pub fn strip_query_slots(template: &str) -> String {
    let Some((base, query)) = template.split_once('?') else {
        return template.to_string();
    };
    let fixed: Vec<&str> = query
        .split('&')
        .filter(|pair| pair.contains('='))
        .collect();
    if fixed.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{}", fixed.join("&"))
    }
}

/// Appends encoded `name=value` pairs in order, using `?` when the endpoint
/// has no query yet and `&` otherwise.
///
/// ```
/// use restbench_util::http_path_resolution::append_query_pairs;
///
/// let pairs = [("q".to_string(), "a b".to_string())];
/// assert_eq!(append_query_pairs("/search", &pairs), "/search?q=a%20b");
/// assert_eq!(append_query_pairs("/search?page=2", &pairs), "/search?page=2&q=a%20b");
/// ```
pub fn append_query_pairs(endpoint: &str, pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return endpoint.to_string();
    }
    let query = pairs
        .iter()
        .map(|(name, value)| format!("{}={}", encode_component(name), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&");
    let separator = match endpoint.find('?') {
        None => "?",
        Some(_) if endpoint.ends_with('?') || endpoint.ends_with('&') => "",
        Some(_) => "&",
    };
    format!("{endpoint}{separator}{query}")
}
