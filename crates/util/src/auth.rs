use indexmap::IndexMap;
use restbench_types::{AuthDescriptor, AuthSecret, KeyLocation, RequestAssembly};
use tracing::debug;

use crate::http_path_resolution::append_query_pairs;

/// Applies the credential described by `auth` to an already routed request.
///
/// Bearer tokens go into `Authorization`. API keys go into a header, a query
/// parameter appended after the routed ones, or a single `Cookie` header that
/// replaces any cookie set before. A missing or empty secret leaves the
/// assembly unchanged.
pub fn apply_auth(auth: &AuthDescriptor, secret: &AuthSecret, mut assembly: RequestAssembly) -> RequestAssembly {
    match auth {
        AuthDescriptor::None => {}
        AuthDescriptor::Bearer => match non_empty(secret.token.as_deref()) {
            Some(token) => set_header(&mut assembly.headers, "Authorization", format!("Bearer {token}")),
            None => debug!("bearer auth configured without a token; sending unauthenticated"),
        },
        AuthDescriptor::ApiKey { key_name, key_location } => {
            let Some(api_key) = non_empty(secret.api_key.as_deref()) else {
                debug!(key = %key_name, "api key auth configured without a key; sending unauthenticated");
                return assembly;
            };
            match key_location {
                KeyLocation::Header => set_header(&mut assembly.headers, key_name, api_key.to_string()),
                KeyLocation::Query => {
                    assembly.final_endpoint =
                        append_query_pairs(&assembly.final_endpoint, &[(key_name.clone(), api_key.to_string())]);
                }
                KeyLocation::Cookie => set_header(&mut assembly.headers, "Cookie", format!("{key_name}={api_key}")),
            }
        }
    }
    assembly
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

/// Sets a header, replacing an existing entry whose name differs only in case.
fn set_header(headers: &mut IndexMap<String, String>, name: &str, value: String) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value);
}
