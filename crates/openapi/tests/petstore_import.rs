use std::path::PathBuf;

use restbench_openapi::{ConvertOptions, ConversionError, convert, import_document, load_openapi_file};
use restbench_types::{ApiDescriptor, ArrayItem, AuthDescriptor, FieldKind, KeyLocation, ParamLocation};
use serde_json::json;

fn fixture() -> serde_json::Value {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    load_openapi_file(&root.join("tests/fixtures/petstore.yaml")).expect("load petstore fixture")
}

fn find<'a>(descriptors: &'a [ApiDescriptor], id: &str) -> &'a ApiDescriptor {
    descriptors
        .iter()
        .find(|descriptor| descriptor.id == id)
        .unwrap_or_else(|| panic!("descriptor {id} missing"))
}

#[test]
fn one_descriptor_per_supported_verb() {
    let descriptors = convert(&fixture(), &ConvertOptions::default()).expect("convert");
    let ids: Vec<&str> = descriptors.iter().map(|descriptor| descriptor.id.as_str()).collect();
    assert_eq!(ids, ["listpets", "createpet", "get__pets__petid_", "deletepet", "uploadphoto"]);
}

#[test]
fn relative_server_is_joined_with_source_origin() {
    let options = ConvertOptions::default().with_source_origin("https://petstore.example");
    let descriptors = convert(&fixture(), &options).expect("convert");
    assert_eq!(find(&descriptors, "listpets").endpoint, "https://petstore.example/api/v3/pets");
    assert_eq!(
        find(&descriptors, "deletepet").endpoint,
        "https://petstore.example/api/v3/pets/{petId}"
    );

    let without_origin = convert(&fixture(), &ConvertOptions::default()).expect("convert");
    assert_eq!(find(&without_origin, "listpets").endpoint, "/pets");
}

#[test]
fn list_operation_merges_path_level_parameters_and_drops_cookies() {
    let descriptors = convert(&fixture(), &ConvertOptions::default()).expect("convert");
    let list = find(&descriptors, "listpets");

    let names: Vec<&str> = list.fields.iter().map(|field| field.name.as_str()).collect();
    assert_eq!(names, ["limit", "status"]);
    assert_eq!(list.tag, "pets");
    assert_eq!(list.name, "List pets");

    let limit = &list.fields[0];
    assert_eq!(limit.location, ParamLocation::Query);
    assert_eq!(limit.default_value, Some(json!(20)));
    let FieldKind::Number(bounds) = &limit.kind else {
        panic!("limit should be a number field");
    };
    assert_eq!((bounds.min, bounds.max, bounds.step), (Some(1.0), Some(100.0), Some(1.0)));

    assert!(matches!(
        &list.fields[1].kind,
        FieldKind::Array {
            item: ArrayItem::Select { .. }
        }
    ));
}

#[test]
fn auth_follows_operation_then_document_security() {
    let descriptors = convert(&fixture(), &ConvertOptions::default()).expect("convert");
    assert_eq!(
        find(&descriptors, "listpets").auth,
        AuthDescriptor::ApiKey {
            key_name: "api_key".into(),
            key_location: KeyLocation::Query
        }
    );
    assert_eq!(find(&descriptors, "createpet").auth, AuthDescriptor::Bearer);
    assert_eq!(find(&descriptors, "deletepet").auth, AuthDescriptor::None);
}

#[test]
fn referenced_request_body_expands_after_parameters() {
    let descriptors = convert(&fixture(), &ConvertOptions::default()).expect("convert");
    let create = find(&descriptors, "createpet");

    let names: Vec<&str> = create.fields.iter().map(|field| field.name.as_str()).collect();
    assert_eq!(names, ["limit", "name", "birthday", "contact", "vaccinated", "tags", "parent"]);

    let name = create.field("name").expect("name field");
    assert!(name.required);
    assert_eq!(name.location, ParamLocation::Body);
    assert_eq!(create.field("birthday").expect("birthday").kind.name(), "date");
    assert!(
        create
            .field("contact")
            .and_then(|field| field.kind.text_constraints())
            .and_then(|constraints| constraints.pattern.as_ref())
            .is_some()
    );

    let FieldKind::Array {
        item: ArrayItem::Object { fields },
    } = &create.field("tags").expect("tags").kind
    else {
        panic!("tags should be an object array");
    };
    let item_names: Vec<&str> = fields.iter().map(|field| field.name.as_str()).collect();
    assert_eq!(item_names, ["label", "weight"]);
}

#[test]
fn path_parameter_is_forced_required_and_defaults_apply() {
    let descriptors = convert(&fixture(), &ConvertOptions::default()).expect("convert");
    let get = find(&descriptors, "get__pets__petid_");
    assert_eq!(get.name, "GET /pets/{petId}");
    assert_eq!(get.description, "Fetch a single pet");
    assert_eq!(get.tag, "Sonstige");

    let pet_id = get.field("petId").expect("petId");
    assert!(pet_id.required);
    assert_eq!(pet_id.location, ParamLocation::Path);
}

#[test]
fn non_json_bodies_contribute_no_fields() {
    let descriptors = convert(&fixture(), &ConvertOptions::default()).expect("convert");
    let names: Vec<&str> = find(&descriptors, "uploadphoto")
        .fields
        .iter()
        .map(|field| field.name.as_str())
        .collect();
    assert_eq!(names, ["petId"]);
}

#[test]
fn selected_operations_limit_the_import() {
    let options = ConvertOptions::default().with_selected_operations(["POST /pets", "DELETE /pets/{petId}"]);
    let descriptors = convert(&fixture(), &options).expect("convert");
    let ids: Vec<&str> = descriptors.iter().map(|descriptor| descriptor.id.as_str()).collect();
    assert_eq!(ids, ["createpet", "deletepet"]);
}

#[test]
fn missing_paths_is_the_only_hard_failure() {
    let error = import_document(r#"{"openapi": "3.0.0", "info": {}}"#, &ConvertOptions::default())
        .expect_err("paths are required");
    assert!(matches!(error, ConversionError::MissingPaths));

    let empty = import_document("openapi: 3.0.0\npaths: {}\n", &ConvertOptions::default()).expect("empty paths");
    assert!(empty.is_empty());
}
