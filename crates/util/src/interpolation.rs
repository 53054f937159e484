//! `{{name}}` environment variable interpolation for request parts.

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use restbench_types::RequestAssembly;
use serde_json::{Map, Value};
use tracing::debug;

static VARIABLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("variable placeholder regex should compile"));

/// Replaces `{{name}}` with the value of `name`. Unknown names are left in
/// place so the user can spot them.
///
/// ```
/// use indexmap::IndexMap;
/// use restbench_util::interpolation::resolve_variables;
///
/// let vars = IndexMap::from([("host".to_string(), "api.local".to_string())]);
/// assert_eq!(resolve_variables("https://{{host}}/{{missing}}", &vars), "https://api.local/{{missing}}");
/// ```
pub fn resolve_variables(text: &str, variables: &IndexMap<String, String>) -> String {
    VARIABLE_PATTERN
        .replace_all(text, |caps: &Captures| match variables.get(&caps[1]) {
            Some(value) => value.clone(),
            None => {
                debug!(variable = &caps[1], "no value for variable; leaving placeholder");
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Lists the distinct variable names referenced in `text`, in first-use order.
pub fn find_variables(text: &str) -> Vec<String> {
    VARIABLE_PATTERN
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Interpolates every string leaf of a form value map.
///
/// Run this before routing: path and query values are percent-encoded there,
/// after which `{{name}}` no longer matches.
pub fn resolve_value_variables(mut values: Map<String, Value>, variables: &IndexMap<String, String>) -> Map<String, Value> {
    if !variables.is_empty() {
        values.values_mut().for_each(|value| resolve_value(value, variables));
    }
    values
}

/// Interpolates the endpoint, header values and every string leaf of the body.
pub fn resolve_assembly_variables(mut assembly: RequestAssembly, variables: &IndexMap<String, String>) -> RequestAssembly {
    if variables.is_empty() {
        return assembly;
    }
    assembly.final_endpoint = resolve_variables(&assembly.final_endpoint, variables);
    for value in assembly.headers.values_mut() {
        *value = resolve_variables(value, variables);
    }
    for value in assembly.body.values_mut() {
        resolve_value(value, variables);
    }
    assembly
}

fn resolve_value(value: &mut Value, variables: &IndexMap<String, String>) {
    match value {
        Value::String(text) => *text = resolve_variables(text, variables),
        Value::Array(items) => items.iter_mut().for_each(|item| resolve_value(item, variables)),
        Value::Object(map) => map.values_mut().for_each(|item| resolve_value(item, variables)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars() -> IndexMap<String, String> {
        IndexMap::from([
            ("baseUrl".to_string(), "https://staging.example.com".to_string()),
            ("token".to_string(), "s3cr3t".to_string()),
        ])
    }

    #[test]
    fn known_names_replaced_unknown_kept() {
        assert_eq!(
            resolve_variables("{{baseUrl}}/pets?x={{nope}}", &vars()),
            "https://staging.example.com/pets?x={{nope}}"
        );
        assert_eq!(resolve_variables("{{ baseUrl }}", &vars()), "{{ baseUrl }}");
    }

    #[test]
    fn find_variables_is_distinct_and_ordered() {
        assert_eq!(find_variables("{{b}} {{a}} {{b}} {{c-d}}"), ["b", "a"]);
        assert!(find_variables("plain").is_empty());
    }

    #[test]
    fn values_resolved_before_routing_reach_path_and_query() {
        use crate::routing::route;
        use restbench_types::{Field, FieldKind, ParamLocation};

        let fields = [
            Field::new("id", "Id", FieldKind::default()).with_location(ParamLocation::Path),
            Field::new("q", "Q", FieldKind::default()).with_location(ParamLocation::Query),
        ];
        let variables = IndexMap::from([
            ("petId".to_string(), "7".to_string()),
            ("term".to_string(), "cat food".to_string()),
        ]);
        let Value::Object(values) = json!({"id": "{{petId}}", "q": ["{{term}}", "{{unset}}"]}) else {
            unreachable!()
        };

        let values = resolve_value_variables(values, &variables);
        let assembly = route("/pets/{id}", &values, &fields);
        assert_eq!(assembly.final_endpoint, "/pets/7?q=cat%20food&q=%7B%7Bunset%7D%7D");
    }

    #[test]
    fn assembly_interpolation_reaches_nested_body_strings() {
        let mut assembly = RequestAssembly {
            final_endpoint: "{{baseUrl}}/pets".into(),
            ..Default::default()
        };
        assembly.headers.insert("X-Token".into(), "{{token}}".into());
        assembly.body.insert("owner".into(), json!({"note": "by {{token}}", "count": 2, "tags": ["{{baseUrl}}"]}));

        let resolved = resolve_assembly_variables(assembly, &vars());
        assert_eq!(resolved.final_endpoint, "https://staging.example.com/pets");
        assert_eq!(resolved.headers.get("X-Token").map(String::as_str), Some("s3cr3t"));
        assert_eq!(
            resolved.body.get("owner"),
            Some(&json!({"note": "by s3cr3t", "count": 2, "tags": ["https://staging.example.com"]}))
        );
    }
}
