//! Local `$ref` resolution within a single OpenAPI document.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use serde_json::Value;
use tracing::warn;

/// Upper bound on `$ref` -> `$ref` hops followed by [`dereference`].
const MAX_REFERENCE_CHAIN: usize = 16;

/// Returns the `$ref` string of a node, if it is a reference object.
pub fn reference_of(node: &Value) -> Option<&str> {
    node.get("$ref").and_then(Value::as_str)
}

/// Resolves a local reference such as `#/components/schemas/Pet`.
///
/// The pointer segments are percent-decoded and JSON-pointer unescaped
/// (`~1` -> `/`, `~0` -> `~`) before walking the document. Returns `None` for
/// non-local references or when any segment is missing; never panics.
///
/// ```
/// use serde_json::json;
/// use restbench_openapi::refs::resolve_ref;
///
/// let document = json!({"components": {"schemas": {"Pet": {"type": "object"}}}});
/// assert_eq!(resolve_ref("#/components/schemas/Pet", &document), Some(&json!({"type": "object"})));
/// assert_eq!(resolve_ref("#/components/schemas/Missing", &document), None);
/// ```
pub fn resolve_ref<'a>(reference: &str, document: &'a Value) -> Option<&'a Value> {
    let Some(pointer) = normalize_reference(reference).strip_prefix("#/") else {
        warn!(reference = %reference, "unsupported $ref; only local '#/' references are resolved");
        return None;
    };

    let mut current = document;
    for raw_segment in pointer.split('/') {
        let segment = unescape_segment(raw_segment);
        let next = match current {
            Value::Object(map) => map.get(segment.as_ref()),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => {
                warn!(reference = %reference, segment = %segment, "could not resolve $ref");
                return None;
            }
        }
    }
    Some(current)
}

/// Canonical form of a reference: a trailing `/` after the last segment is
/// dropped, so `#/a/` and `#/a` name the same node.
pub(crate) fn normalize_reference(reference: &str) -> &str {
    match reference.strip_suffix('/') {
        Some(trimmed) if trimmed.len() > 1 => trimmed,
        _ => reference,
    }
}

/// Follows `node` through any chain of `$ref`s to the first non-reference node.
///
/// Returns `node` itself when it is not a reference. Returns `None` when a
/// reference cannot be resolved or the chain loops back on itself.
pub fn dereference<'a>(node: &'a Value, document: &'a Value) -> Option<&'a Value> {
    let mut current = node;
    let mut seen: Vec<&str> = Vec::new();
    while let Some(reference) = reference_of(current) {
        if seen.contains(&reference) || seen.len() >= MAX_REFERENCE_CHAIN {
            warn!(reference = %reference, "cyclic $ref chain; giving up");
            return None;
        }
        seen.push(reference);
        current = resolve_ref(reference, document)?;
    }
    Some(current)
}

fn unescape_segment(raw: &str) -> Cow<'_, str> {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    if decoded.contains('~') {
        Cow::Owned(decoded.replace("~1", "/").replace("~0", "~"))
    } else {
        decoded
    }
}
