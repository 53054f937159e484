//! OpenAPI 3.x import for Restbench.
//!
//! Turns an in-memory OpenAPI document into [`ApiDescriptor`]s whose fields a
//! form can render and whose locations the request router understands.

use restbench_types::ApiDescriptor;
use serde_json::Value;

pub mod auth;
pub mod error;
pub mod export;
pub mod io;
pub mod openapi;
pub mod parameters;
pub mod refs;
pub mod schema;

pub use auth::extract_auth;
pub use error::ConversionError;
pub use export::descriptors_to_openapi;
pub use io::{PreflightWarning, collect_preflight_warnings, load_openapi_file, parse_openapi_document};
pub use openapi::{ConvertOptions, base_url_from_document, convert, source_origin_from_url};
pub use parameters::parameters_to_fields;
pub use refs::resolve_ref;
pub use schema::{property_to_field, schema_to_fields};

/// Parses document text, runs the preflight checks and converts it.
pub fn import_document(text: &str, options: &ConvertOptions) -> Result<Vec<ApiDescriptor>, ConversionError> {
    let document: Value = parse_openapi_document(text)?;
    collect_preflight_warnings(&document);
    convert(&document, options)
}
