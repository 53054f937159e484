//! Operation parameters to form fields.
//!
//! Parameters have no `properties` container, so they are mapped on their own
//! path, reusing the primitive rules of [`crate::schema`] for `parameter.schema`.

use restbench_types::{Field, FieldKind, ParamLocation, SelectOption, TextConstraints};
use serde_json::Value;
use tracing::{debug, warn};

use crate::refs::{dereference, reference_of};
use crate::schema::{
    SchemaResolutionContext, apply_enum_override, array_item, format_label, number_constraints, schema_type,
    string_kind,
};

/// Collects the effective parameters of an operation.
///
/// Path-item parameters come first, followed by operation parameters. An
/// operation parameter with the same `name` and `in` replaces the path-item
/// entry in place. `$ref` entries are resolved; unresolvable ones are dropped.
///
/// ```rust
/// use serde_json::json;
/// use restbench_openapi::parameters::collect_parameters;
///
/// let document = json!({
///     "components": {"parameters": {"Limit": {"name": "limit", "in": "query", "schema": {"type": "integer"}}}}
/// });
/// let path_item = json!({"parameters": [
///     {"$ref": "#/components/parameters/Limit"},
///     {"name": "id", "in": "path", "required": true}
/// ]});
/// let operation = json!({"parameters": [{"name": "limit", "in": "query", "required": true}]});
///
/// let collected = collect_parameters(&document, &path_item, &operation);
/// assert_eq!(collected.len(), 2);
/// assert_eq!(collected[0]["required"], json!(true));
/// assert_eq!(collected[1]["name"], "id");
/// ```
pub fn collect_parameters<'a>(document: &'a Value, path_item: &'a Value, operation: &'a Value) -> Vec<&'a Value> {
    let mut out: Vec<&'a Value> = Vec::new();
    let mut seen: Vec<(&'a str, &'a str)> = Vec::new();

    let declared = [path_item, operation]
        .into_iter()
        .filter_map(|node| node.get("parameters").and_then(Value::as_array))
        .flatten();

    for entry in declared {
        let Some(parameter) = dereference(entry, document) else {
            continue;
        };
        let name = parameter.get("name").and_then(Value::as_str).unwrap_or_default();
        let location = parameter.get("in").and_then(Value::as_str).unwrap_or_default();
        if name.is_empty() || location.is_empty() {
            continue;
        }
        match seen.iter().position(|(n, l)| *n == name && *l == location) {
            Some(index) => out[index] = parameter,
            None => {
                out.push(parameter);
                seen.push((name, location));
            }
        }
    }
    out
}

/// Converts a parameter list into fields, in declaration order.
///
/// Entries may be `$ref`s; unresolvable references are skipped. Only `query`,
/// `path` and `header` parameters are kept. Path parameters are always
/// required.
pub fn parameters_to_fields(parameters: &[Value], document: &Value) -> Vec<Field> {
    parameters
        .iter()
        .filter_map(|entry| {
            let resolved = dereference(entry, document);
            if resolved.is_none() {
                warn!(reference = reference_of(entry).unwrap_or_default(), "skipping unresolvable parameter");
            }
            resolved
        })
        .filter_map(|parameter| parameter_to_field(parameter, document))
        .collect()
}

/// Converts one already-resolved parameter object. Returns `None` for
/// unsupported locations or a missing name.
pub fn parameter_to_field(parameter: &Value, document: &Value) -> Option<Field> {
    let name = parameter.get("name").and_then(Value::as_str)?;
    let raw_location = parameter.get("in").and_then(Value::as_str).unwrap_or_default();
    let Some(location) = ParamLocation::from_openapi_in(raw_location) else {
        debug!(parameter = %name, location = %raw_location, "dropping parameter with unsupported location");
        return None;
    };

    let schema = parameter
        .get("schema")
        .and_then(|schema| dereference(schema, document))
        .unwrap_or(&Value::Null);

    let kind = match schema_type(schema) {
        Some("string") => string_kind(schema),
        Some("integer") => FieldKind::Number(number_constraints(schema, true)),
        Some("number") => FieldKind::Number(number_constraints(schema, false)),
        // Query strings carry booleans as text, so both value and label are strings.
        Some("boolean") => FieldKind::BooleanSelect {
            options: vec![SelectOption::new("true", "true"), SelectOption::new("false", "false")],
        },
        Some("array") => {
            let mut context = SchemaResolutionContext::default();
            FieldKind::Array {
                item: array_item(schema, document, &mut context),
            }
        }
        _ => FieldKind::Text(TextConstraints::default()),
    };
    let kind = apply_enum_override(kind, schema, SelectOption::stringified);

    let required = location == ParamLocation::Path
        || parameter.get("required").and_then(Value::as_bool).unwrap_or(false);

    let mut field = Field::new(name, format_label(name), kind)
        .with_location(location)
        .with_required(required);
    field.default_value = schema.get("default").cloned();
    field.example_value = schema.get("example").or_else(|| parameter.get("example")).cloned();
    field.help_text = parameter
        .get("description")
        .or_else(|| schema.get("description"))
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(field)
}
