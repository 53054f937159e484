use restbench_types::{AuthDescriptor, KeyLocation};
use serde_json::Value;
use tracing::debug;

/// Header name used when an `apiKey` scheme omits `name`.
pub const DEFAULT_API_KEY_NAME: &str = "X-API-Key";

/// Derives the auth descriptor for an operation.
///
/// The operation's `security` wins over the document-level one. Only the first
/// scheme of the first requirement is considered.
pub fn extract_auth(document: &Value, operation: &Value) -> AuthDescriptor {
    let requirements = operation
        .get("security")
        .or_else(|| document.get("security"))
        .and_then(Value::as_array);

    let Some(scheme_name) = requirements
        .and_then(|requirements| requirements.first())
        .and_then(Value::as_object)
        .and_then(|requirement| requirement.keys().next())
    else {
        return AuthDescriptor::None;
    };

    let Some(scheme) = document
        .get("components")
        .and_then(|components| components.get("securitySchemes"))
        .and_then(|schemes| schemes.get(scheme_name))
    else {
        debug!(scheme = %scheme_name, "security requirement names an undefined scheme");
        return AuthDescriptor::None;
    };

    let scheme_type = scheme.get("type").and_then(Value::as_str).unwrap_or_default();
    match scheme_type {
        "http" if scheme
            .get("scheme")
            .and_then(Value::as_str)
            .is_some_and(|value| value.eq_ignore_ascii_case("bearer")) =>
        {
            AuthDescriptor::Bearer
        }
        "apiKey" => AuthDescriptor::ApiKey {
            key_name: scheme
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .unwrap_or(DEFAULT_API_KEY_NAME)
                .to_string(),
            key_location: scheme
                .get("in")
                .and_then(Value::as_str)
                .and_then(KeyLocation::from_openapi_in)
                .unwrap_or_default(),
        },
        other => {
            debug!(scheme = %scheme_name, kind = %other, "unsupported security scheme; treating as unauthenticated");
            AuthDescriptor::None
        }
    }
}
