use serde::{Deserialize, Serialize};

use crate::field::Field;

/// Grouping key used when an operation declares no tags.
pub const DEFAULT_TAG: &str = "Sonstige";

/// Placement of an API key credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyLocation {
    #[default]
    Header,
    Query,
    Cookie,
}

impl KeyLocation {
    /// Parses an OpenAPI security scheme `in` value.
    pub fn from_openapi_in(value: &str) -> Option<Self> {
        match value {
            "header" => Some(Self::Header),
            "query" => Some(Self::Query),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }
}

/// Authentication requirement of an operation.
///
/// Describes only the mechanism and placement; the secret itself is supplied
/// at request time as an [`AuthSecret`](crate::AuthSecret).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum AuthDescriptor {
    #[default]
    None,
    Bearer,
    #[serde(rename = "apikey")]
    ApiKey { key_name: String, key_location: KeyLocation },
}

impl AuthDescriptor {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// One operation (path + verb) converted into a testable unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDescriptor {
    /// Slug derived from `operationId` or `method_path`
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Absolute URL template, may contain `{param}` placeholders
    pub endpoint: String,
    /// Uppercase HTTP verb
    pub method: String,
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default)]
    pub auth: AuthDescriptor,
    /// Parameter fields first, then body fields
    #[serde(default)]
    pub fields: Vec<Field>,
}

fn default_tag() -> String {
    DEFAULT_TAG.to_string()
}

impl ApiDescriptor {
    /// Key used to select operations during import (`"GET /pets"`).
    pub fn operation_key(method: &str, path: &str) -> String {
        format!("{} {}", method.to_ascii_uppercase(), path)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}
