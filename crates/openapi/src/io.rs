//! Reading OpenAPI documents and advisory preflight checks.

use std::{fs, path::Path};

use serde_json::Value;
use tracing::warn;

use crate::error::ConversionError;
use crate::openapi::SUPPORTED_METHODS;

/// Parses document text as JSON, falling back to YAML.
///
/// # Errors
/// [`ConversionError::Parse`] when the text is neither, carrying the YAML
/// parser's message.
pub fn parse_openapi_document(text: &str) -> Result<Value, ConversionError> {
    if let Ok(document) = serde_json::from_str::<Value>(text) {
        return Ok(document);
    }
    let yaml = serde_yaml::from_str::<serde_yaml::Value>(text).map_err(|error| ConversionError::Parse {
        message: error.to_string(),
    })?;
    serde_json::to_value(yaml).map_err(|error| ConversionError::Parse {
        message: error.to_string(),
    })
}

/// Reads and parses a document from disk.
pub fn load_openapi_file(path: &Path) -> Result<Value, ConversionError> {
    let text = fs::read_to_string(path).map_err(|source| ConversionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_openapi_document(&text)
}

/// A non-fatal observation about an imported document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightWarning {
    /// JSON path the warning refers to.
    pub path: String,
    /// Stable rule identifier.
    pub rule: &'static str,
    pub message: String,
}

impl PreflightWarning {
    fn new(path: impl Into<String>, rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            rule,
            message: message.into(),
        }
    }
}

/// Checks import readiness: a `3.x` version string and at least one supported
/// operation. Conversion proceeds regardless; each warning is also logged.
pub fn collect_preflight_warnings(document: &Value) -> Vec<PreflightWarning> {
    let mut warnings = Vec::new();

    match document.get("openapi") {
        Some(Value::String(version)) if version.starts_with("3.") => {}
        Some(Value::String(version)) => warnings.push(PreflightWarning::new(
            "$.openapi",
            "openapi_version",
            format!("unsupported OpenAPI version '{version}'; expected a 3.x document"),
        )),
        Some(_) => warnings.push(PreflightWarning::new(
            "$.openapi",
            "openapi_version",
            "field `openapi` must be a string starting with `3.`",
        )),
        None => match document.get("swagger").and_then(Value::as_str) {
            Some(swagger) => warnings.push(PreflightWarning::new(
                "$.swagger",
                "openapi_version",
                format!("Swagger {swagger} document detected; parameters and bodies may not convert"),
            )),
            None => warnings.push(PreflightWarning::new(
                "$.openapi",
                "openapi_version",
                "missing `openapi` field; expected an OpenAPI 3.x document",
            )),
        },
    }

    if let Some(paths) = document.get("paths").and_then(Value::as_object) {
        let has_operation = paths.values().filter_map(Value::as_object).any(|item| {
            item.keys()
                .any(|key| SUPPORTED_METHODS.contains(&key.to_ascii_lowercase().as_str()))
        });
        if !has_operation {
            warnings.push(PreflightWarning::new(
                "$.paths",
                "paths_operations",
                "no get/post/put/patch/delete operations found",
            ));
        }
    }

    for warning in &warnings {
        warn!(path = %warning.path, rule = warning.rule, "{}", warning.message);
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn parses_json_and_yaml_to_the_same_tree() {
        let from_json = parse_openapi_document(r#"{"openapi": "3.0.0", "paths": {}}"#).expect("json");
        let from_yaml = parse_openapi_document("openapi: 3.0.0\npaths: {}\n").expect("yaml");
        assert_eq!(from_json, from_yaml);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let error = parse_openapi_document("{ not: [valid").expect_err("should fail");
        assert!(matches!(error, ConversionError::Parse { .. }));
    }

    #[test]
    fn loads_from_disk_and_reports_missing_files() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "openapi: 3.0.3\npaths:\n  /pets:\n    get: {{}}").expect("write");
        let document = load_openapi_file(file.path()).expect("load");
        assert_eq!(document["openapi"], json!("3.0.3"));

        let missing = load_openapi_file(Path::new("/definitely/not/here.yaml")).expect_err("missing");
        assert!(matches!(missing, ConversionError::Io { .. }));
    }

    #[test]
    fn preflight_flags_swagger_and_empty_paths() {
        let warnings = collect_preflight_warnings(&json!({"swagger": "2.0", "paths": {"/x": {"parameters": []}}}));
        let rules: Vec<&str> = warnings.iter().map(|warning| warning.rule).collect();
        assert_eq!(rules, ["openapi_version", "paths_operations"]);

        assert!(collect_preflight_warnings(&json!({"openapi": "3.1.0", "paths": {"/x": {"GET": {}}}})).is_empty());
    }
}
