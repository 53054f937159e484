//! OpenAPI document to API descriptor conversion.
//!
//! Every `path × verb` pair among `get|post|put|patch|delete` becomes one
//! [`ApiDescriptor`]: parameter fields first, then JSON body fields, plus the
//! effective auth requirement and an absolute endpoint template.

use restbench_types::{ApiDescriptor, DEFAULT_TAG, Field};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::extract_auth;
use crate::error::ConversionError;
use crate::parameters::{collect_parameters, parameter_to_field};
use crate::refs::dereference;
use crate::schema::schema_to_fields;

pub(crate) const SUPPORTED_METHODS: [&str; 5] = ["get", "post", "put", "patch", "delete"];
const JSON_MEDIA_TYPE: &str = "application/json";

/// Options for a conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Origin (`scheme://host[:port]`) the document was fetched from. Needed to
    /// absolutize relative `servers[0].url` values.
    pub source_origin: Option<String>,
    /// Base URL that replaces whatever the document's servers declare.
    pub base_url: Option<String>,
    /// Restricts the import to these `"METHOD path"` keys. `None` imports all.
    pub selected_operations: Option<Vec<String>>,
}

impl ConvertOptions {
    pub fn with_source_origin(mut self, origin: impl Into<String>) -> Self {
        self.source_origin = Some(origin.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_selected_operations<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_operations = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    fn is_selected(&self, method: &str, path: &str) -> bool {
        match &self.selected_operations {
            None => true,
            Some(keys) => {
                let key = ApiDescriptor::operation_key(method, path);
                keys.iter().any(|selected| selected.trim() == key)
            }
        }
    }
}

/// Converts an OpenAPI 3.x document into API descriptors, in document order.
///
/// # Errors
/// Returns [`ConversionError::MissingPaths`] when the document has no `paths`
/// object. Every other defect degrades to partial output with a warning.
pub fn convert(document: &Value, options: &ConvertOptions) -> Result<Vec<ApiDescriptor>, ConversionError> {
    let paths = document
        .get("paths")
        .and_then(Value::as_object)
        .ok_or(ConversionError::MissingPaths)?;

    let base_url = match options.base_url.as_deref().filter(|base| !base.is_empty()) {
        Some(base) => base.trim_end_matches('/').to_string(),
        None => base_url_from_document(document, options.source_origin.as_deref()),
    };

    let mut descriptors = Vec::new();
    for (path, path_item) in paths {
        let Some(path_item) = dereference(path_item, document) else {
            continue;
        };
        let Some(operations) = path_item.as_object() else {
            warn!(path = %path, "path item is not an object; skipping");
            continue;
        };

        for (method, operation) in operations {
            let method = method.to_ascii_lowercase();
            if !SUPPORTED_METHODS.contains(&method.as_str()) || !options.is_selected(&method, path) {
                continue;
            }
            let descriptor = build_descriptor(document, path_item, operation, &method, path, &base_url);
            debug!(id = %descriptor.id, fields = descriptor.fields.len(), "converted operation");
            descriptors.push(descriptor);
        }
    }

    info!(operations = descriptors.len(), "converted OpenAPI document");
    Ok(descriptors)
}

fn build_descriptor(
    document: &Value,
    path_item: &Value,
    operation: &Value,
    method: &str,
    path: &str,
    base_url: &str,
) -> ApiDescriptor {
    let text = |key: &str| {
        operation
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    };
    let operation_id = text("operationId");
    let summary = text("summary");
    let upper_method = method.to_ascii_uppercase();

    let mut fields: Vec<Field> = Vec::new();
    let parameter_fields = collect_parameters(document, path_item, operation)
        .into_iter()
        .filter_map(|parameter| parameter_to_field(parameter, document));
    for field in parameter_fields.chain(body_fields(document, operation)) {
        if let Some(kept) = fields.iter().find(|kept| kept.name == field.name) {
            warn!(
                field = %field.name,
                kept = ?kept.location,
                dropped = ?field.location,
                path = %path,
                method = %upper_method,
                "duplicate field name; keeping the first"
            );
            continue;
        }
        fields.push(field);
    }

    ApiDescriptor {
        id: operation_slug(operation_id, method, path),
        name: summary
            .or(operation_id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{upper_method} {path}")),
        description: text("description").or(summary).unwrap_or_default().to_string(),
        endpoint: format!("{base_url}{path}"),
        method: upper_method,
        tag: operation
            .get("tags")
            .and_then(Value::as_array)
            .and_then(|tags| tags.first())
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TAG)
            .to_string(),
        auth: extract_auth(document, operation),
        fields,
    }
}

/// Fields of the `application/json` request body, if any.
fn body_fields(document: &Value, operation: &Value) -> Vec<Field> {
    let Some(request_body) = operation.get("requestBody").and_then(|body| dereference(body, document)) else {
        return Vec::new();
    };
    let Some(schema) = request_body
        .get("content")
        .and_then(|content| content.get(JSON_MEDIA_TYPE))
        .and_then(|media| media.get("schema"))
    else {
        debug!("request body has no application/json schema; no body fields");
        return Vec::new();
    };
    schema_to_fields(schema, &[], document)
}

/// Builds the descriptor id: lowercased `operationId`, or `method_path`, with
/// every character outside `[a-z0-9_]` replaced by `_`.
pub fn operation_slug(operation_id: Option<&str>, method: &str, path: &str) -> String {
    let raw = match operation_id {
        Some(id) => id.to_string(),
        None => format!("{method}_{path}"),
    };
    raw.to_lowercase()
        .chars()
        .map(|ch| if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' { ch } else { '_' })
        .collect()
}

/// Derives the base URL from `servers[0].url`.
///
/// Absolute URLs are used as-is. Relative URLs starting with `/` are joined to
/// `source_origin`; without an origin the base is empty and a warning is
/// logged, as it is when `servers` is absent. Server variables are replaced by
/// their declared defaults.
pub fn base_url_from_document(document: &Value, source_origin: Option<&str>) -> String {
    let Some(server) = document
        .get("servers")
        .and_then(Value::as_array)
        .and_then(|servers| servers.first())
    else {
        warn!("document declares no servers; endpoints have no base URL");
        return String::new();
    };

    let raw_url = server.get("url").and_then(Value::as_str).unwrap_or_default();
    let server_url = substitute_server_variables(raw_url, server.get("variables"));

    if server_url.starts_with('/') {
        return match source_origin.filter(|origin| !origin.is_empty()) {
            Some(origin) => format!("{}{}", origin.trim_end_matches('/'), server_url),
            None => {
                warn!(server_url = %server_url, "server URL is relative and no source origin is known; endpoints have no base URL");
                String::new()
            }
        };
    }
    server_url
}

fn substitute_server_variables(url: &str, variables: Option<&Value>) -> String {
    let Some(variables) = variables.and_then(Value::as_object) else {
        return url.to_string();
    };
    variables.iter().fold(url.to_string(), |acc, (name, variable)| {
        match variable.get("default").and_then(Value::as_str) {
            Some(default) => acc.replace(&format!("{{{name}}}"), default),
            None => acc,
        }
    })
}

/// Returns `scheme://host[:port]` of an import URL, or `None` when the URL
/// does not parse or has an opaque origin.
///
/// ```
/// use restbench_openapi::openapi::source_origin_from_url;
///
/// assert_eq!(
///     source_origin_from_url("https://petstore3.swagger.io/api/v3/openapi.json").as_deref(),
///     Some("https://petstore3.swagger.io")
/// );
/// assert_eq!(source_origin_from_url("not a url"), None);
/// ```
pub fn source_origin_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let origin = parsed.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}
