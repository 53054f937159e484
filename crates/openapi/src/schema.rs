//! JSON Schema to form field mapping.
//!
//! Object schemas become one [`Field`] per property, in document order. Arrays
//! of objects recurse into their item schema to build nested item fields.
//! Recursion is bounded: every `$ref` entered is tracked on the active branch
//! and a repeated reference stops expanding with an empty field list.

use std::collections::HashSet;

use heck::ToTitleCase;
use restbench_types::{
    ArrayItem, DateConstraints, Field, FieldKind, NumberConstraints, SelectOption, TextConstraints,
};
use serde_json::Value;

use crate::refs::{dereference, normalize_reference, reference_of};

const MAX_SCHEMA_RESOLUTION_DEPTH: usize = 64;

/// Strings longer than this become a multi-line control.
const TEXTAREA_MIN_MAX_LENGTH: u64 = 100;

/// Built-in pattern injected for `format: email` when no pattern is declared.
pub const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";
pub const EMAIL_PATTERN_ERROR: &str = "Bitte gültige E-Mail-Adresse eingeben";

pub const BOOLEAN_TRUE_LABEL: &str = "Ja";
pub const BOOLEAN_FALSE_LABEL: &str = "Nein";

static EMPTY_SCHEMA: Value = Value::Null;

#[derive(Default)]
pub(crate) struct SchemaResolutionContext {
    depth: usize,
    visited_references: HashSet<String>,
}

/// Runs `resolver` inside a frame for `maybe_reference`, or returns
/// `fallback()` when the depth cap is hit or the reference is already active
/// on the current branch.
fn with_resolution_frame<T, FResolver, FFallback>(
    context: &mut SchemaResolutionContext,
    maybe_reference: Option<&str>,
    fallback: FFallback,
    resolver: FResolver,
) -> T
where
    FResolver: FnOnce(&mut SchemaResolutionContext) -> T,
    FFallback: FnOnce() -> T,
{
    if context.depth >= MAX_SCHEMA_RESOLUTION_DEPTH {
        return fallback();
    }

    let reference = maybe_reference.map(|reference| normalize_reference(reference).to_string());
    if let Some(reference) = reference.as_ref()
        && !context.visited_references.insert(reference.clone())
    {
        tracing::debug!(reference = %reference, "recursive $ref; not expanding further");
        return fallback();
    }

    context.depth += 1;
    let result = resolver(context);
    context.depth -= 1;

    if let Some(reference) = reference {
        context.visited_references.remove(&reference);
    }

    result
}

/// Converts an object schema into form fields.
///
/// `schema` may be a `$ref`; an unresolvable reference, or a schema without
/// `properties`, yields no fields. The schema's own `required` array takes
/// precedence over `required_names`.
pub fn schema_to_fields(schema: &Value, required_names: &[String], document: &Value) -> Vec<Field> {
    let mut context = SchemaResolutionContext::default();
    schema_to_fields_internal(schema, required_names, document, &mut context)
}

pub(crate) fn schema_to_fields_internal(
    schema: &Value,
    required_names: &[String],
    document: &Value,
    context: &mut SchemaResolutionContext,
) -> Vec<Field> {
    with_resolution_frame(context, reference_of(schema), Vec::new, |context| {
        let Some(resolved) = dereference(schema, document) else {
            return Vec::new();
        };
        let Some(properties) = resolved.get("properties").and_then(Value::as_object) else {
            return Vec::new();
        };

        let required = resolved
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).map(str::to_string).collect::<Vec<_>>())
            .unwrap_or_else(|| required_names.to_vec());

        properties
            .iter()
            .map(|(name, property)| {
                let is_required = required.iter().any(|required_name| required_name == name);
                property_to_field_internal(name, property, is_required, document, context)
            })
            .collect()
    })
}

/// Converts a single schema property into a field.
pub fn property_to_field(name: &str, schema: &Value, required: bool, document: &Value) -> Field {
    let mut context = SchemaResolutionContext::default();
    property_to_field_internal(name, schema, required, document, &mut context)
}

fn property_to_field_internal(
    name: &str,
    schema: &Value,
    required: bool,
    document: &Value,
    context: &mut SchemaResolutionContext,
) -> Field {
    let schema = dereference(schema, document).unwrap_or(&EMPTY_SCHEMA);

    let kind = match schema_type(schema) {
        Some("string") => string_kind(schema),
        Some("integer") => FieldKind::Number(number_constraints(schema, true)),
        Some("number") => FieldKind::Number(number_constraints(schema, false)),
        Some("boolean") => FieldKind::BooleanSelect {
            options: vec![
                SelectOption::new(true, BOOLEAN_TRUE_LABEL),
                SelectOption::new(false, BOOLEAN_FALSE_LABEL),
            ],
        },
        Some("array") => FieldKind::Array {
            item: array_item(schema, document, context),
        },
        _ => FieldKind::Text(TextConstraints::default()),
    };
    let kind = apply_enum_override(kind, schema, SelectOption::from_scalar);

    let label = schema
        .get("title")
        .and_then(Value::as_str)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format_label(name));

    let mut field = Field::new(name, label, kind).with_required(required);
    field.default_value = schema.get("default").cloned();
    field.example_value = schema.get("example").cloned();
    field.help_text = schema.get("description").and_then(Value::as_str).map(str::to_string);
    field
}

/// Reads a schema's primitive `type`. OpenAPI 3.1 style type arrays
/// (`["string", "null"]`) yield their first non-null entry.
pub(crate) fn schema_type(schema: &Value) -> Option<&str> {
    match schema.get("type")? {
        Value::String(ty) => Some(ty.as_str()),
        Value::Array(types) => types.iter().filter_map(Value::as_str).find(|ty| *ty != "null"),
        _ => None,
    }
}

/// Maps a string schema to `date`, `textarea` or `text`, with constraints.
pub(crate) fn string_kind(schema: &Value) -> FieldKind {
    match schema.get("format").and_then(Value::as_str) {
        Some(format @ ("date" | "date-time")) => FieldKind::Date(DateConstraints {
            min: schema.get("minimum").cloned(),
            max: schema.get("maximum").cloned(),
            date_time: format == "date-time",
        }),
        _ => {
            let constraints = text_constraints(schema);
            if constraints.max_length.is_some_and(|max| max > TEXTAREA_MIN_MAX_LENGTH) {
                FieldKind::Textarea(constraints)
            } else {
                FieldKind::Text(constraints)
            }
        }
    }
}

fn text_constraints(schema: &Value) -> TextConstraints {
    let mut constraints = TextConstraints {
        min_length: schema.get("minLength").and_then(Value::as_u64),
        max_length: schema.get("maxLength").and_then(Value::as_u64),
        pattern: schema
            .get("pattern")
            .and_then(Value::as_str)
            .filter(|pattern| !pattern.is_empty())
            .map(str::to_string),
        pattern_error: None,
    };
    if constraints.pattern.is_none() && schema.get("format").and_then(Value::as_str) == Some("email") {
        constraints.pattern = Some(EMAIL_PATTERN.to_string());
        constraints.pattern_error = Some(EMAIL_PATTERN_ERROR.to_string());
    }
    constraints
}

pub(crate) fn number_constraints(schema: &Value, integer: bool) -> NumberConstraints {
    NumberConstraints {
        min: schema.get("minimum").and_then(Value::as_f64),
        max: schema.get("maximum").and_then(Value::as_f64),
        step: integer.then_some(1.0),
    }
}

/// Derives the element shape of an array schema.
///
/// Items are `$ref`-resolved first. Object items recurse into their
/// properties; an item reference already being expanded on this branch yields
/// an object item with no fields.
pub(crate) fn array_item(schema: &Value, document: &Value, context: &mut SchemaResolutionContext) -> ArrayItem {
    let Some(items) = schema.get("items") else {
        return ArrayItem::Text;
    };
    let Some(item_schema) = dereference(items, document) else {
        return ArrayItem::Text;
    };

    if schema_type(item_schema) == Some("object") || item_schema.get("properties").is_some() {
        return ArrayItem::Object {
            fields: schema_to_fields_internal(items, &[], document, context),
        };
    }
    if let Some(values) = item_schema.get("enum").and_then(Value::as_array) {
        return ArrayItem::Select {
            options: values.iter().map(SelectOption::stringified).collect(),
        };
    }
    match schema_type(item_schema) {
        Some("integer" | "number") => ArrayItem::Number,
        _ => ArrayItem::Text,
    }
}

/// Replaces a non-array kind with a select when the schema declares `enum`.
pub(crate) fn apply_enum_override(kind: FieldKind, schema: &Value, to_option: fn(&Value) -> SelectOption) -> FieldKind {
    if matches!(kind, FieldKind::Array { .. }) {
        return kind;
    }
    match schema.get("enum").and_then(Value::as_array) {
        Some(values) => FieldKind::Select {
            options: values.iter().map(to_option).collect(),
        },
        None => kind,
    }
}

/// Formats a property name as a display label (`petName` -> `Pet Name`).
pub fn format_label(name: &str) -> String {
    name.to_title_case()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_property_maps_bounds_and_step() {
        let field = property_to_field("count", &json!({"type": "integer", "minimum": 1, "maximum": 10}), false, &json!({}));
        assert_eq!(
            field.kind,
            FieldKind::Number(NumberConstraints {
                min: Some(1.0),
                max: Some(10.0),
                step: Some(1.0)
            })
        );
    }

    #[test]
    fn long_strings_become_textarea_and_dates_ignore_length() {
        let document = json!({});
        let notes = property_to_field("notes", &json!({"type": "string", "maxLength": 500}), false, &document);
        assert_eq!(notes.kind.name(), "textarea");

        let short = property_to_field("code", &json!({"type": "string", "maxLength": 100}), false, &document);
        assert_eq!(short.kind.name(), "text");

        let born = property_to_field("born", &json!({"type": "string", "format": "date-time", "maxLength": 500}), false, &document);
        assert!(matches!(born.kind, FieldKind::Date(DateConstraints { date_time: true, .. })));
    }

    #[test]
    fn email_format_injects_pattern_only_without_explicit_one() {
        let document = json!({});
        let email = property_to_field("email", &json!({"type": "string", "format": "email"}), true, &document);
        let constraints = email.kind.text_constraints().expect("text constraints");
        assert_eq!(constraints.pattern.as_deref(), Some(EMAIL_PATTERN));
        assert_eq!(constraints.pattern_error.as_deref(), Some(EMAIL_PATTERN_ERROR));

        let custom = property_to_field(
            "email",
            &json!({"type": "string", "format": "email", "pattern": "^.+@corp\\.com$"}),
            true,
            &document,
        );
        let constraints = custom.kind.text_constraints().expect("text constraints");
        assert_eq!(constraints.pattern.as_deref(), Some("^.+@corp\\.com$"));
        assert!(constraints.pattern_error.is_none());
    }

    #[test]
    fn enum_overrides_primitive_kind_and_keeps_scalar_values() {
        let field = property_to_field("size", &json!({"type": "integer", "enum": [1, 2, 3]}), false, &json!({}));
        let options = field.kind.options().expect("select options");
        assert_eq!(field.kind.name(), "select");
        assert_eq!(options[0].value, json!(1));
        assert_eq!(options[0].label, "1");
    }

    #[test]
    fn boolean_property_uses_localized_options() {
        let field = property_to_field("active", &json!({"type": "boolean"}), false, &json!({}));
        let options = field.kind.options().expect("options");
        assert_eq!(field.kind.name(), "boolean-select");
        assert_eq!(options, &[SelectOption::new(true, "Ja"), SelectOption::new(false, "Nein")]);
    }

    #[test]
    fn metadata_copies_to_field() {
        let field = property_to_field(
            "petName",
            &json!({"type": "string", "default": "Rex", "example": "Bello", "description": "Name of the pet"}),
            false,
            &json!({}),
        );
        assert_eq!(field.label, "Pet Name");
        assert_eq!(field.default_value, Some(json!("Rex")));
        assert_eq!(field.example_value, Some(json!("Bello")));
        assert_eq!(field.help_text.as_deref(), Some("Name of the pet"));
    }

    #[test]
    fn nullable_type_arrays_use_first_concrete_type() {
        let field = property_to_field("age", &json!({"type": ["null", "integer"]}), false, &json!({}));
        assert_eq!(field.kind.name(), "number");
    }
}
