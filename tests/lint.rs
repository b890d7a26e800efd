use layergen::error::GenerateError;
use layergen::ir::{EntityDef, FieldDef, FieldKind, FieldSet, KeyType, SchemaModel};
use layergen::loader::parse_settings;
use layergen::{generate_from_paths, lint_paths, lint_schema};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const SETTINGS: &str = "format_version = 1\n\n[entities.backend]\nnamespace = \"Demo.Models\"\n";

fn project(schema: &str) -> (tempfile::TempDir, Vec<PathBuf>) {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("app.settings.toml"), SETTINGS).unwrap();
    fs::write(dir.path().join("model.schema.toml"), schema).unwrap();
    let inputs = vec![dir.path().to_path_buf()];
    (dir, inputs)
}

fn entity(name: &str, fields: Vec<FieldDef>) -> EntityDef {
    let text = format!("name = \"{}\"", name);
    let mut entity: EntityDef = toml::from_str(&text).unwrap();
    entity.fields = FieldSet(fields);
    entity
}

fn key(name: &str) -> FieldDef {
    let mut field = FieldDef::new(name, FieldKind::Key);
    field.key_type = Some(KeyType::Int);
    field
}

#[test]
fn lint_passes_for_valid_schema() {
    let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/shop");
    assert_eq!(lint_paths(&[fixture]).unwrap(), Vec::<String>::new());
}

#[test]
fn more_than_one_key_is_rejected() {
    let settings = parse_settings(Path::new("app.settings.toml"), SETTINGS).unwrap();
    let schema = SchemaModel {
        entities: vec![entity("Country", vec![key("Id"), key("LegacyId")])],
        ..Default::default()
    };
    let errors = lint_schema(&schema, &settings);
    assert_eq!(
        errors,
        vec!["Entity Country declares 2 key fields; at most one is allowed".to_string()]
    );
}

#[test]
fn unknown_references_are_reported() {
    let (_dir, inputs) = project(
        r#"format_version = 1

[[entity]]
name = "Order"

[[entity.fields]]
name = "Customer"
kind = "entity"
type = "Customer"

[[entity.fields]]
name = "Status"
kind = "enum"
type = "OrderStatus"
"#,
    );
    let errors = lint_paths(&inputs).unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("unknown Entity type Customer"));
    assert!(errors[1].contains("unknown Enum type OrderStatus"));
}

#[test]
fn permissions_require_authentication() {
    let (_dir, inputs) = project(
        r#"format_version = 1

[[entity]]
name = "Order"

[entity.getter.service]

[entity.getter.endpoint]
permissions = ["Sales"]
"#,
    );
    let errors = lint_paths(&inputs).unwrap();
    assert_eq!(
        errors,
        vec!["Getter Order lists permissions but does not require authentication".to_string()]
    );
}

#[test]
fn persistence_backed_directive_needs_storage() {
    let (_dir, inputs) = project(
        r#"format_version = 1

[[entity]]
name = "Order"

[entity.handler.service]
persistence_backed = true
"#,
    );
    let errors = lint_paths(&inputs).unwrap();
    assert_eq!(
        errors,
        vec!["Handler Order is persistence backed but Order has no storage entity".to_string()]
    );
}

#[test]
fn endpoint_without_service_is_rejected() {
    let (_dir, inputs) = project(
        r#"format_version = 1

[[entity]]
name = "Order"

[entity.collection_getter.endpoint]
"#,
    );
    let errors = lint_paths(&inputs).unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Getter Orders exposes an endpoint"));
}

#[test]
fn generation_refuses_an_invalid_schema() {
    let (_dir, inputs) = project(
        r#"format_version = 1

[[enum]]
name = "Status"

[[enum.values]]
name = "Open"

[[enum.values]]
name = "Open"
"#,
    );
    let err = generate_from_paths(&inputs).unwrap_err();
    match err {
        GenerateError::InvalidSchema(errors) => {
            assert_eq!(errors, vec!["Enum Status declares value Open more than once".to_string()]);
        }
        other => panic!("expected an invalid schema error, got {:?}", other),
    }
}

#[test]
fn field_names_must_start_with_an_upper_case_letter() {
    let (_dir, inputs) = project(
        r#"format_version = 1

[[entity]]
name = "Person"

[[entity.fields]]
name = "event"
kind = "string"
"#,
    );
    assert_eq!(
        lint_paths(&inputs).unwrap(),
        vec!["Field event of Entity Person must start with an upper-case letter".to_string()]
    );
}
