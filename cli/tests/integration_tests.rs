use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn write(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).expect("failed to create fixture dir");
    fs::write(path, contents).expect("failed to write fixture");
}

/// Root document with one external schema and one local one.
fn fixture() -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    write(
        dir.path(),
        "api/openapi.yaml",
        r##"openapi: 3.0.3
info:
  title: Fixture
  version: "1.0"
paths:
  /pets:
    get:
      parameters:
        - $include: ./common/paging.yaml
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
                $ref: ./models/Error.yaml
components:
  schemas:
    Pet:
      type: object
"##,
    );
    write(
        dir.path(),
        "api/common/paging.yaml",
        "- name: limit\n  in: query\n- name: offset\n  in: query\n",
    );
    write(dir.path(), "api/models/Error.yaml", "type: object\n");
    dir
}

fn run(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schema-bundle"))
        .current_dir(dir.path())
        .args(args)
        .output()
        .expect("failed to run schema-bundle")
}

#[test]
fn test_bundle_writes_json_output() {
    let dir = fixture();
    let output = run(
        &dir,
        &["bundle", "api/openapi.yaml", "--output", "dist/openapi.json", "--no-remote"],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let raw = fs::read_to_string(dir.path().join("dist/openapi.json")).unwrap();
    let bundled: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(bundled["components"]["schemas"]["Error"]["type"], "object");
    assert_eq!(
        bundled["paths"]["/pets"]["get"]["parameters"]
            .as_array()
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn test_bundle_to_stdout_defaults_to_yaml() {
    let dir = fixture();
    let output = run(&dir, &["bundle", "api/openapi.yaml"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("openapi:"));
    assert!(stdout.contains("$ref: '#/components/schemas/Error'"));
}

#[test]
fn test_config_file_sets_default_format() {
    let dir = fixture();
    write(dir.path(), ".schema-bundle.yml", "output:\n  format: json\n");

    let output = run(&dir, &["bundle", "api/openapi.yaml"]);
    assert!(output.status.success());
    let bundled: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(bundled["info"]["title"], "Fixture");
}

#[test]
fn test_components_lists_final_names() {
    let dir = fixture();
    let output = run(&dir, &["components", "api/openapi.yaml", "--format", "json"]);
    assert!(output.status.success());

    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listing.as_array().unwrap().len(), 1);
    assert_eq!(listing[0]["kind"], "schemas");
    assert_eq!(listing[0]["name"], "Error");
    assert_eq!(listing[0]["ref"], "#/components/schemas/Error");
}

#[test]
fn test_check_passes_on_bundle_and_fails_on_source() {
    let dir = fixture();
    let status = run(
        &dir,
        &["bundle", "api/openapi.yaml", "-o", "dist/openapi.yaml"],
    )
    .status;
    assert!(status.success());

    let bundled = run(&dir, &["check", "dist/openapi.yaml"]);
    assert!(bundled.status.success());

    let source = run(&dir, &["check", "api/openapi.yaml"]);
    assert!(!source.status.success());
    let stdout = String::from_utf8_lossy(&source.stdout);
    assert!(stdout.contains("./models/Error.yaml"));
    assert!(stdout.contains("./common/paging.yaml"));
    assert!(String::from_utf8_lossy(&source.stderr).contains("error: 2 problem(s) found"));
}

#[test]
fn test_missing_reference_exits_with_error() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "root.yaml",
        "components:\n  schemas:\n    A:\n      items:\n        $ref: ./Missing.yaml\n",
    );

    let output = run(&dir, &["bundle", "root.yaml"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: failed to load"));
    assert!(stderr.contains("Missing.yaml"));
}

#[test]
fn test_no_remote_rejects_remote_reference() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "root.yaml",
        "components:\n  schemas:\n    A:\n      items:\n        $ref: https://example.com/Pet.yaml\n",
    );

    let output = run(&dir, &["bundle", "root.yaml", "--no-remote"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("remote references are disabled"));
}
