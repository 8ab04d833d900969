use std::path::Path;

use schema_bundle_core::{BundleError, ComponentKind, validate_bundle};
use schema_bundle_io::{BundleConfig, Bundler, IoError, OutputFormat, RemoteConfig, parse_text};
use serde_json::json;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn offline_bundler() -> Bundler {
    let config = BundleConfig {
        remote: RemoteConfig {
            enabled: false,
            ..RemoteConfig::default()
        },
        ..BundleConfig::default()
    };
    Bundler::new(config).unwrap()
}

fn keys(node: &serde_json::Value) -> Vec<&str> {
    node.as_object().unwrap().keys().map(String::as_str).collect()
}

fn petstore() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "openapi.yaml",
        r##"
openapi: 3.0.3
info:
  title: Petstore
  version: "1.0"
paths:
  /pets:
    get:
      responses:
        "200":
          description: pets
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Pet"
        default:
          description: error
          content:
            application/json:
              schema:
                $ref: ./schemas/Error.yaml
components:
  schemas:
    Pet:
      type: object
      discriminator:
        propertyName: petType
        mapping:
          cat: "#/components/schemas/Cat"
          dog: "#/components/schemas/Dog"
    Cat:
      type: object
    Dog:
      type: object
"##,
    );
    write(
        dir.path(),
        "schemas/Error.yaml",
        "type: object\nproperties:\n  code:\n    type: integer\n  message:\n    type: string\n",
    );
    dir
}

// ---------------------------------------------------------------------------
// Bundling from disk
// ---------------------------------------------------------------------------

#[test]
fn test_bundle_petstore_from_disk() {
    let dir = petstore();
    let bundled = offline_bundler()
        .bundle_file(dir.path().join("openapi.yaml"))
        .unwrap();

    assert_eq!(
        keys(&bundled["components"]["schemas"]),
        vec!["Pet", "Cat", "Dog", "Error"]
    );
    assert_eq!(
        bundled["components"]["schemas"]["Error"]["properties"]["code"],
        json!({ "type": "integer" })
    );
    assert_eq!(
        bundled["paths"]["/pets"]["get"]["responses"]["default"]["content"]["application/json"]
            ["schema"]["$ref"],
        "#/components/schemas/Error"
    );
    assert!(validate_bundle(&bundled).is_empty());
}

#[test]
fn test_glob_inclusion_from_disk() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "root.yaml",
        "openapi: 3.0.3\npaths:\n  $include: ./paths/*.yaml\n",
    );
    write(dir.path(), "paths/pets.yaml", "get:\n  summary: pets\n");
    write(dir.path(), "paths/users.yaml", "get:\n  summary: users\n");
    write(
        dir.path(),
        "paths/orders.yaml",
        "get:\n  summary: orders\n  responses:\n    default:\n      description: e\n      content:\n        application/json:\n          schema:\n            $ref: ../models/Order.json\n",
    );
    write(dir.path(), "models/Order.json", r#"{"type": "object"}"#);

    let bundled = offline_bundler()
        .bundle_file(dir.path().join("root.yaml"))
        .unwrap();
    assert_eq!(keys(&bundled["paths"]), vec!["orders", "pets", "users"]);
    assert_eq!(keys(&bundled["components"]["schemas"]), vec!["Order"]);
    assert!(validate_bundle(&bundled).is_empty());
}

#[test]
fn test_colliding_files_get_directory_suffixes() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "root.yaml",
        r#"
components:
  schemas:
    Order:
      properties:
        billing:
          $ref: ./billing/Error.yaml
        users:
          $ref: ./users/Error.yaml
"#,
    );
    write(dir.path(), "billing/Error.yaml", "title: billing\n");
    write(dir.path(), "users/Error.yaml", "title: users\n");

    let bundler = offline_bundler();
    let bundled = bundler.bundle_file(dir.path().join("root.yaml")).unwrap();
    let schemas = &bundled["components"]["schemas"];
    assert_eq!(schemas["Error_billing"]["title"], "billing");
    assert_eq!(schemas["Error_users"]["title"], "users");
    assert_eq!(
        schemas["Order"]["properties"]["users"]["$ref"],
        "#/components/schemas/Error_users"
    );

    let components = bundler.components(dir.path().join("root.yaml")).unwrap();
    let names: Vec<&str> = components.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Error_billing", "Error_users"]);
    assert!(components.iter().all(|c| c.kind == ComponentKind::Schemas));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn test_remote_reference_fails_when_disabled() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "root.yaml",
        "components:\n  schemas:\n    A:\n      items:\n        $ref: https://example.com/Pet.yaml\n",
    );

    let err = offline_bundler()
        .bundle_file(dir.path().join("root.yaml"))
        .unwrap_err();
    assert!(matches!(err, IoError::Bundle(BundleError::Fetch { .. })));
}

#[test]
fn test_missing_reference_target_is_a_load_error() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "root.yaml",
        "components:\n  schemas:\n    A:\n      items:\n        $ref: ./Missing.yaml\n",
    );

    let err = offline_bundler()
        .bundle_file(dir.path().join("root.yaml"))
        .unwrap_err();
    assert!(matches!(err, IoError::Bundle(BundleError::Load { .. })));
}

#[test]
fn test_invalid_root_document_is_a_yaml_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "root.yaml", "paths: [unclosed\n");

    let err = offline_bundler()
        .bundle_file(dir.path().join("root.yaml"))
        .unwrap_err();
    assert!(matches!(err, IoError::YamlError(_)));
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[test]
fn test_write_infers_format_from_extension() {
    let dir = petstore();
    let bundler = offline_bundler();
    let bundled = bundler.bundle_file(dir.path().join("openapi.yaml")).unwrap();

    let output = dir.path().join("dist/openapi.json");
    bundler.write(&bundled, Some(&output), None).unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    let reparsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(reparsed, bundled);
}

#[test]
fn test_explicit_format_wins_over_extension() {
    let dir = petstore();
    let bundler = offline_bundler();
    let bundled = bundler.bundle_file(dir.path().join("openapi.yaml")).unwrap();

    let output = dir.path().join("bundle.json");
    bundler
        .write(&bundled, Some(&output), Some(OutputFormat::Yaml))
        .unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("openapi:"));
    assert_eq!(parse_text(&text, "bundle.yaml").unwrap(), bundled);
}
