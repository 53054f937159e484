//! Form field model derived from OpenAPI schemas and parameters.
//!
//! A [`Field`] describes one input control and, through its
//! [`ParamLocation`], where the entered value goes in the outgoing request.
//! The control type lives in [`FieldKind`], a tagged union whose variants carry
//! only the constraints that make sense for that control.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a field's value is placed in the outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    /// JSON body property (default for schema-derived fields)
    #[default]
    Body,
    /// Query string parameter (e.g., `?page=2`)
    Query,
    /// Path template placeholder (e.g., `/users/{id}`)
    Path,
    /// Request header
    Header,
}

impl ParamLocation {
    /// Parses an OpenAPI `in` value. Only the locations a form can route are
    /// recognized; `cookie` and unknown values return `None`.
    pub fn from_openapi_in(value: &str) -> Option<Self> {
        match value {
            "query" => Some(Self::Query),
            "path" => Some(Self::Path),
            "header" => Some(Self::Header),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Query => "query",
            Self::Path => "path",
            Self::Header => "header",
        }
    }
}

impl std::fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a select control.
///
/// `value` keeps the original JSON scalar (for example `true` or `3`) so the
/// body receives the declared type; `label` is the display string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: Value,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Builds an option whose value and label are both the stringified scalar.
    pub fn stringified(value: &Value) -> Self {
        let text = scalar_to_string(value);
        Self {
            value: Value::String(text.clone()),
            label: text,
        }
    }

    /// Builds an option that keeps the original scalar and stringifies the label.
    pub fn from_scalar(value: &Value) -> Self {
        Self {
            value: value.clone(),
            label: scalar_to_string(value),
        }
    }
}

/// Renders a JSON scalar the way a form displays it (strings without quotes).
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// String constraints shared by single-line and multi-line text fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Message shown when `pattern` does not match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_error: Option<String>,
}

/// Numeric bounds; `step` is `Some(1.0)` for integer schemas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

/// Date bounds copied from the schema as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
    /// `true` when the schema declared `format: date-time`
    #[serde(default)]
    pub date_time: bool,
}

/// Element shape of an array field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "itemType", rename_all = "lowercase")]
pub enum ArrayItem {
    Text,
    Number,
    Select {
        #[serde(rename = "itemOptions")]
        options: Vec<SelectOption>,
    },
    Object {
        #[serde(rename = "itemFields")]
        fields: Vec<Field>,
    },
}

/// The control type of a field together with its meaningful constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldKind {
    Text(TextConstraints),
    Textarea(TextConstraints),
    Number(NumberConstraints),
    BooleanSelect { options: Vec<SelectOption> },
    Select { options: Vec<SelectOption> },
    Date(DateConstraints),
    Array { item: ArrayItem },
}

impl FieldKind {
    /// Stable kind identifier, identical to the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Textarea(_) => "textarea",
            Self::Number(_) => "number",
            Self::BooleanSelect { .. } => "boolean-select",
            Self::Select { .. } => "select",
            Self::Date(_) => "date",
            Self::Array { .. } => "array",
        }
    }

    /// Options for select-like kinds.
    pub fn options(&self) -> Option<&[SelectOption]> {
        match self {
            Self::BooleanSelect { options } | Self::Select { options } => Some(options),
            _ => None,
        }
    }

    /// Text constraints for `text` and `textarea` kinds.
    pub fn text_constraints(&self) -> Option<&TextConstraints> {
        match self {
            Self::Text(constraints) | Self::Textarea(constraints) => Some(constraints),
            _ => None,
        }
    }
}

impl Default for FieldKind {
    fn default() -> Self {
        Self::Text(TextConstraints::default())
    }
}

/// Conditional visibility rule: the field is shown only when `field`
/// currently holds `value` (or one of the values in a set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowIf {
    pub field: String,
    pub value: ShowIfValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShowIfValue {
    AnyOf(Vec<Value>),
    Equals(Value),
}

impl ShowIf {
    /// Returns true when `current` satisfies the rule. Scalars are compared by
    /// their display form so `"true"` from a select matches a `true` rule.
    pub fn matches(&self, current: Option<&Value>) -> bool {
        let Some(current) = current else {
            return false;
        };
        let current = scalar_to_string(current);
        match &self.value {
            ShowIfValue::Equals(expected) => scalar_to_string(expected) == current,
            ShowIfValue::AnyOf(candidates) => candidates.iter().any(|candidate| scalar_to_string(candidate) == current),
        }
    }
}

/// One form input derived from a schema property or an operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Property or parameter name; unique within a descriptor
    pub name: String,
    /// Human-readable label
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "paramLocation")]
    pub location: ParamLocation,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_if: Option<ShowIf>,
}

impl Field {
    /// Creates a body field with the given kind and no metadata.
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            required: false,
            location: ParamLocation::Body,
            kind,
            default_value: None,
            example_value: None,
            help_text: None,
            show_if: None,
        }
    }

    pub fn with_location(mut self, location: ParamLocation) -> Self {
        self.location = location;
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_show_if(mut self, show_if: ShowIf) -> Self {
        self.show_if = Some(show_if);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_serializes_kind_tag_and_constraints_flat() {
        let field = Field::new(
            "age",
            "Age",
            FieldKind::Number(NumberConstraints {
                min: Some(1.0),
                max: Some(10.0),
                step: Some(1.0),
            }),
        )
        .with_location(ParamLocation::Query);

        let value = serde_json::to_value(&field).expect("serialize field");
        assert_eq!(value["type"], json!("number"));
        assert_eq!(value["paramLocation"], json!("query"));
        assert_eq!(value["min"], json!(1.0));
        assert_eq!(value["step"], json!(1.0));
        assert!(value.get("minLength").is_none(), "text constraints must not leak into number fields");
    }

    #[test]
    fn boolean_select_uses_kebab_case_tag() {
        let field = Field::new(
            "active",
            "Active",
            FieldKind::BooleanSelect {
                options: vec![SelectOption::new(true, "Ja"), SelectOption::new(false, "Nein")],
            },
        );
        let value = serde_json::to_value(&field).expect("serialize field");
        assert_eq!(value["type"], json!("boolean-select"));
        assert_eq!(value["options"][0]["value"], json!(true));
    }

    #[test]
    fn show_if_matches_scalars_by_display_form() {
        let rule = ShowIf {
            field: "mode".into(),
            value: ShowIfValue::AnyOf(vec![json!("advanced"), json!(true)]),
        };
        assert!(rule.matches(Some(&json!("advanced"))));
        assert!(rule.matches(Some(&json!("true"))));
        assert!(!rule.matches(Some(&json!("basic"))));
        assert!(!rule.matches(None));
    }

    #[test]
    fn location_parses_only_routable_openapi_values() {
        assert_eq!(ParamLocation::from_openapi_in("path"), Some(ParamLocation::Path));
        assert_eq!(ParamLocation::from_openapi_in("cookie"), None);
        assert_eq!(ParamLocation::from_openapi_in("body"), None);
    }
}
