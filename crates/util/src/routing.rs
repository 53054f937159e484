//! Routing of form values into the parts of an HTTP request.

use indexmap::IndexMap;
use restbench_types::{Field, ParamLocation, RequestAssembly, scalar_to_string};
use serde_json::{Map, Value};
use tracing::trace;

use crate::http_path_resolution::{append_query_pairs, strip_query_slots, substitute_placeholder};

/// Returns true for values a form treats as "not entered".
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}

/// Builds the request parts for one submission.
///
/// Fields are visited in order and blank values are skipped. Path values
/// replace `{name}` (percent-encoded), query values become `name=value` pairs
/// (one per element for arrays), headers are set verbatim and everything else
/// lands in the JSON body unchanged. Bare query keys in the template
/// (`?active`) are slots, not values, and are removed before the routed pairs
/// are appended.
///
/// ```
/// use restbench_types::{Field, FieldKind, ParamLocation};
/// use restbench_util::routing::route;
/// use serde_json::json;
///
/// let fields = vec![
///     Field::new("id", "Id", FieldKind::default()).with_location(ParamLocation::Path),
///     Field::new("tags", "Tags", FieldKind::default()).with_location(ParamLocation::Query),
/// ];
/// let values = json!({"id": "42", "tags": ["x", "y"]});
/// let assembly = route("/users/{id}?active", values.as_object().unwrap(), &fields);
/// assert_eq!(assembly.final_endpoint, "/users/42?tags=x&tags=y");
/// ```
pub fn route(endpoint_template: &str, values: &Map<String, Value>, fields: &[Field]) -> RequestAssembly {
    let mut endpoint = strip_query_slots(endpoint_template);
    let mut query: Vec<(String, String)> = Vec::new();
    let mut headers: IndexMap<String, String> = IndexMap::new();
    let mut body: Map<String, Value> = Map::new();

    for field in fields {
        let Some(value) = values.get(&field.name).filter(|value| !is_blank(Some(value))) else {
            continue;
        };

        match field.location {
            ParamLocation::Path => {
                endpoint = substitute_placeholder(&endpoint, &field.name, &scalar_to_string(value));
            }
            ParamLocation::Query => match value {
                Value::Array(items) => query.extend(
                    items
                        .iter()
                        .filter(|item| !is_blank(Some(item)))
                        .map(|item| (field.name.clone(), scalar_to_string(item))),
                ),
                scalar => query.push((field.name.clone(), scalar_to_string(scalar))),
            },
            ParamLocation::Header => {
                headers.insert(field.name.clone(), scalar_to_string(value));
            }
            ParamLocation::Body => {
                body.insert(field.name.clone(), value.clone());
            }
        }
    }

    let final_endpoint = append_query_pairs(&endpoint, &query);
    trace!(endpoint = %final_endpoint, headers = headers.len(), body_fields = body.len(), "routed request");
    RequestAssembly {
        final_endpoint,
        body,
        headers,
    }
}
