//! Shared type definitions for Restbench.
//!
//! The form field model, API descriptors and the per-submission request
//! assembly live here so the converter, the request builder and the CLI agree
//! on one representation.

pub mod descriptor;
pub mod field;
pub mod request;

pub use descriptor::{ApiDescriptor, AuthDescriptor, DEFAULT_TAG, KeyLocation};
pub use field::{
    ArrayItem, DateConstraints, Field, FieldKind, NumberConstraints, ParamLocation, SelectOption, ShowIf, ShowIfValue,
    TextConstraints, scalar_to_string,
};
pub use request::{AuthSecret, RequestAssembly, RequestConfig};
