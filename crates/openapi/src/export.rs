//! Descriptors back to a minimal OpenAPI 3.0 document.
//!
//! Used to share a hand-edited collection with other tools. The result is
//! deliberately small: one operation per descriptor, a JSON request body for
//! body fields, `parameters` for routed fields and a single `200` response.

use restbench_types::{ApiDescriptor, ArrayItem, AuthDescriptor, Field, FieldKind, KeyLocation, ParamLocation};
use serde_json::{Map, Value, json};
use url::Url;

pub const EXPORT_TITLE: &str = "Restbench Export";
pub const EXPORT_VERSION: &str = "1.0.0";

/// Rebuilds an OpenAPI document from descriptors.
///
/// Paths are taken from the endpoint URL's path component; endpoints that do
/// not parse as absolute URLs are used verbatim. A later descriptor with the
/// same path and method replaces an earlier one.
pub fn descriptors_to_openapi(descriptors: &[ApiDescriptor]) -> Value {
    let mut paths = Map::new();
    let mut security_schemes = Map::new();

    for descriptor in descriptors {
        let path = path_from_endpoint(&descriptor.endpoint);
        let mut operation = Map::new();
        operation.insert("operationId".into(), json!(descriptor.id));
        operation.insert("summary".into(), json!(descriptor.name));
        if !descriptor.description.is_empty() {
            operation.insert("description".into(), json!(descriptor.description));
        }
        operation.insert("tags".into(), json!([descriptor.tag]));

        let (parameters, body): (Vec<&Field>, Vec<&Field>) = descriptor
            .fields
            .iter()
            .partition(|field| field.location != ParamLocation::Body);
        if !parameters.is_empty() {
            operation.insert(
                "parameters".into(),
                Value::Array(parameters.into_iter().map(field_to_parameter).collect()),
            );
        }
        if !body.is_empty() {
            operation.insert(
                "requestBody".into(),
                json!({"content": {"application/json": {"schema": fields_to_schema(body)}}}),
            );
        }

        if let Some((scheme_name, scheme)) = security_scheme(&descriptor.auth) {
            let mut requirement = Map::new();
            requirement.insert(scheme_name.clone(), json!([]));
            operation.insert("security".into(), json!([requirement]));
            security_schemes.insert(scheme_name, scheme);
        }
        operation.insert("responses".into(), json!({"200": {"description": "Successful response"}}));

        let entry = paths.entry(path).or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(methods) = entry {
            methods.insert(descriptor.method.to_ascii_lowercase(), Value::Object(operation));
        }
    }

    let mut document = json!({
        "openapi": "3.0.0",
        "info": {"title": EXPORT_TITLE, "version": EXPORT_VERSION},
        "paths": paths,
    });
    if !security_schemes.is_empty() {
        document["components"] = json!({"securitySchemes": security_schemes});
    }
    document
}

fn path_from_endpoint(endpoint: &str) -> String {
    match Url::parse(endpoint) {
        // `Url` percent-encodes braces, so placeholders are restored.
        Ok(url) => url.path().replace("%7B", "{").replace("%7D", "}"),
        Err(_) => endpoint.to_string(),
    }
}

fn field_to_parameter(field: &Field) -> Value {
    let mut parameter = json!({
        "name": field.name,
        "in": field.location.as_str(),
        "required": field.required || field.location == ParamLocation::Path,
        "schema": field_to_property(field),
    });
    if let Some(help) = &field.help_text {
        parameter["description"] = json!(help);
    }
    parameter
}

fn fields_to_schema(fields: Vec<&Field>) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|field| (field.name.clone(), field_to_property(field)))
        .collect();
    let required: Vec<&str> = fields
        .iter()
        .filter(|field| field.required)
        .map(|field| field.name.as_str())
        .collect();

    let mut schema = json!({"type": "object", "properties": properties});
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn field_to_property(field: &Field) -> Value {
    let mut property = Map::new();
    let mut set = |key: &str, value: Value| {
        property.insert(key.to_string(), value);
    };

    match &field.kind {
        FieldKind::Text(text) | FieldKind::Textarea(text) => {
            set("type", json!("string"));
            if let Some(min) = text.min_length {
                set("minLength", json!(min));
            }
            if let Some(max) = text.max_length {
                set("maxLength", json!(max));
            }
            if let Some(pattern) = &text.pattern {
                set("pattern", json!(pattern));
            }
        }
        FieldKind::Number(number) => {
            let integer = number.step.is_some_and(|step| step == 1.0);
            set("type", json!(if integer { "integer" } else { "number" }));
            if let Some(min) = number.min {
                set("minimum", json!(min));
            }
            if let Some(max) = number.max {
                set("maximum", json!(max));
            }
        }
        FieldKind::BooleanSelect { .. } => set("type", json!("boolean")),
        FieldKind::Select { options } => {
            set("type", json!("string"));
            set("enum", Value::Array(options.iter().map(|option| option.value.clone()).collect()));
        }
        FieldKind::Date(date) => {
            set("type", json!("string"));
            set("format", json!(if date.date_time { "date-time" } else { "date" }));
            if let Some(min) = &date.min {
                set("minimum", min.clone());
            }
            if let Some(max) = &date.max {
                set("maximum", max.clone());
            }
        }
        FieldKind::Array { item } => {
            set("type", json!("array"));
            set("items", item_schema(item));
        }
    }

    set("title", json!(field.label));
    if let Some(help) = &field.help_text {
        set("description", json!(help));
    }
    if let Some(default) = &field.default_value {
        set("default", default.clone());
    }
    if let Some(example) = &field.example_value {
        set("example", example.clone());
    }
    Value::Object(property)
}

fn item_schema(item: &ArrayItem) -> Value {
    match item {
        ArrayItem::Text => json!({"type": "string"}),
        ArrayItem::Number => json!({"type": "number"}),
        ArrayItem::Select { options } => json!({
            "type": "string",
            "enum": options.iter().map(|option| option.value.clone()).collect::<Vec<_>>(),
        }),
        ArrayItem::Object { fields } => fields_to_schema(fields.iter().collect()),
    }
}

fn security_scheme(auth: &AuthDescriptor) -> Option<(String, Value)> {
    match auth {
        AuthDescriptor::None => None,
        AuthDescriptor::Bearer => Some(("bearerAuth".to_string(), json!({"type": "http", "scheme": "bearer"}))),
        AuthDescriptor::ApiKey { key_name, key_location } => {
            let location = match key_location {
                KeyLocation::Header => "header",
                KeyLocation::Query => "query",
                KeyLocation::Cookie => "cookie",
            };
            Some((
                format!("apiKey_{location}_{key_name}"),
                json!({"type": "apiKey", "in": location, "name": key_name}),
            ))
        }
    }
}
