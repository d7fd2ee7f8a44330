//! CLI integration tests for the `attrform` subcommands.
//!
//! Uses `assert_cmd` to spawn the binary against fixture files written
//! into a temporary directory, and checks exit codes, stdout and stderr.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Locate the workspace root by walking up from CARGO_MANIFEST_DIR.
fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

/// Helper: create a Command for the `attrform` binary, rooted at workspace.
fn attrform() -> Command {
    let mut cmd = cargo_bin_cmd!("attrform");
    cmd.current_dir(workspace_root());
    cmd.env_remove("ATTRFORM_API_URL");
    cmd.env_remove("ATTRFORM_AUTH_TOKEN");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_json(dir: &TempDir, name: &str, doc: &Value) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, serde_json::to_string_pretty(doc).unwrap()).unwrap();
    path
}

fn basic_descriptors() -> Value {
    json!([
        { "uuid": "1", "name": "url", "type": "data", "contentType": "string",
          "properties": { "label": "URL", "required": true } },
        { "uuid": "2", "name": "size", "type": "data", "contentType": "integer",
          "properties": { "label": "Key size" } }
    ])
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    attrform()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Mount, render and collect server-declared attribute forms",
        ));
}

#[test]
fn version_exits_0() {
    attrform()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("attrform"));
}

#[test]
fn callbacks_and_api_url_conflict() {
    attrform()
        .args([
            "collect",
            "d.json",
            "--form",
            "f.json",
            "--callbacks",
            "c.json",
            "--api-url",
            "http://localhost",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// ──────────────────────────────────────────────
// 2. Check subcommand
// ──────────────────────────────────────────────

#[test]
fn check_valid_descriptors() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "descriptors.json", &basic_descriptors());
    attrform()
        .args(["check", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid (2 descriptors)"));
}

#[test]
fn check_valid_json_output() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "descriptors.json", &basic_descriptors());
    let output = attrform()
        .args(["--output", "json", "check", path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["valid"], json!(true));
    assert_eq!(report["descriptors"], json!(2));
}

#[test]
fn check_missing_content_type_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_json(
        &dir,
        "descriptors.json",
        &json!([{ "uuid": "1", "name": "url", "type": "data" }]),
    );
    attrform()
        .args(["check", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid"));
}

#[test]
fn check_duplicate_name_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_json(
        &dir,
        "descriptors.json",
        &json!([
            { "uuid": "1", "name": "url", "type": "data", "contentType": "string" },
            { "uuid": "2", "name": "url", "type": "data", "contentType": "text" }
        ]),
    );
    attrform()
        .args(["check", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate attribute name"));
}

#[test]
fn check_unknown_content_type_warns() {
    let dir = TempDir::new().unwrap();
    let path = write_json(
        &dir,
        "descriptors.json",
        &json!([{ "uuid": "1", "name": "shape", "type": "data", "contentType": "hologram" }]),
    );
    attrform()
        .args(["check", path.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("unsupported content type 'hologram'"));
}

#[test]
fn check_missing_file_fails() {
    attrform()
        .args(["--output", "json", "check", "does/not/exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""));
}

// ──────────────────────────────────────────────
// 3. Render subcommand
// ──────────────────────────────────────────────

#[test]
fn render_text_lists_fields() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "descriptors.json", &basic_descriptors());
    attrform()
        .args(["--namespace", "ra", "render", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("namespace: ra"))
        .stdout(predicate::str::contains("URL (url): text [required]"))
        .stdout(predicate::str::contains("Key size (size): integer"));
}

#[test]
fn render_json_plan_with_existing_values() {
    let dir = TempDir::new().unwrap();
    let descriptors = write_json(&dir, "descriptors.json", &basic_descriptors());
    let attributes = write_json(
        &dir,
        "attributes.json",
        &json!([{ "name": "url", "content": [{ "data": "https://ca.example.com" }] }]),
    );
    let output = attrform()
        .args([
            "--output",
            "json",
            "--namespace",
            "ra",
            "render",
            descriptors.to_str().unwrap(),
            "--attributes",
            attributes.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let plan: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["namespace"], json!("ra"));
    let fields = plan["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0]["path"], json!("__attributes__ra__.url"));
    assert_eq!(
        fields[0]["values"]["__attributes__ra__.url"],
        json!("https://ca.example.com")
    );
    assert_eq!(fields[1]["control"], json!({ "kind": "numberInput", "integer": true }));
}

#[test]
fn render_reads_namespace_from_config() {
    let dir = TempDir::new().unwrap();
    let descriptors = write_json(&dir, "descriptors.json", &basic_descriptors());
    let config = dir.path().join("attrform.toml");
    fs::write(&config, "[editor]\nnamespace = \"fromConfig\"\n").unwrap();
    attrform()
        .args([
            "--config",
            config.to_str().unwrap(),
            "render",
            descriptors.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("namespace: fromConfig"));
}

#[test]
fn render_rejects_bad_utc_offset() {
    let dir = TempDir::new().unwrap();
    let descriptors = write_json(&dir, "descriptors.json", &basic_descriptors());
    attrform()
        .args([
            "--utc-offset",
            "soon",
            "render",
            descriptors.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid UTC offset"));
}

// ──────────────────────────────────────────────
// 4. Collect subcommand
// ──────────────────────────────────────────────

#[test]
fn collect_prints_typed_requests() {
    let dir = TempDir::new().unwrap();
    let descriptors = write_json(&dir, "descriptors.json", &basic_descriptors());
    let form = write_json(
        &dir,
        "form.json",
        &json!({ "url": "https://ca.example.com", "size": "2048" }),
    );
    attrform()
        .args([
            "collect",
            descriptors.to_str().unwrap(),
            "--form",
            form.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "url = [{\"data\":\"https://ca.example.com\"}]",
        ))
        .stdout(predicate::str::contains("size = [{\"data\":\"2048\"}]"));
}

#[test]
fn collect_missing_required_value_fails() {
    let dir = TempDir::new().unwrap();
    let descriptors = write_json(&dir, "descriptors.json", &basic_descriptors());
    let form = write_json(&dir, "form.json", &json!({ "size": "4096" }));
    attrform()
        .args([
            "collect",
            descriptors.to_str().unwrap(),
            "--form",
            form.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid form"))
        .stderr(predicate::str::contains("url"));
}

#[test]
fn collect_unknown_attribute_fails() {
    let dir = TempDir::new().unwrap();
    let descriptors = write_json(&dir, "descriptors.json", &basic_descriptors());
    let form = write_json(
        &dir,
        "form.json",
        &json!({ "url": "https://ca.example.com", "nope": "x" }),
    );
    attrform()
        .args([
            "collect",
            descriptors.to_str().unwrap(),
            "--form",
            form.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown attribute: nope"));
}

#[test]
fn collect_datetime_uses_utc_offset() {
    let dir = TempDir::new().unwrap();
    let descriptors = write_json(
        &dir,
        "descriptors.json",
        &json!([{ "uuid": "1", "name": "notBefore", "type": "data", "contentType": "datetime" }]),
    );
    let form = write_json(&dir, "form.json", &json!({ "notBefore": "2024-05-01T12:00" }));
    attrform()
        .args([
            "--utc-offset",
            "+02:00",
            "collect",
            descriptors.to_str().unwrap(),
            "--form",
            form.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "notBefore = [{\"data\":\"2024-05-01T10:00:00.000Z\"}]",
        ));
}

#[test]
fn collect_datetime_follows_host_zone_without_offset() {
    let dir = TempDir::new().unwrap();
    let descriptors = write_json(
        &dir,
        "descriptors.json",
        &json!([
            { "uuid": "1", "name": "notBefore", "type": "data", "contentType": "datetime" },
            { "uuid": "2", "name": "notAfter", "type": "data", "contentType": "datetime" }
        ]),
    );
    let form = write_json(
        &dir,
        "form.json",
        &json!({ "notBefore": "2017-01-15T08:30", "notAfter": "2017-06-01T08:30" }),
    );
    attrform()
        .env("TZ", "Europe/Prague")
        .args([
            "collect",
            descriptors.to_str().unwrap(),
            "--form",
            form.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "notBefore = [{\"data\":\"2017-01-15T07:30:00.000Z\"}]",
        ))
        .stdout(predicate::str::contains(
            "notAfter = [{\"data\":\"2017-06-01T06:30:00.000Z\"}]",
        ));
}

#[test]
fn collect_resolves_dependent_select_from_canned_callbacks() {
    let dir = TempDir::new().unwrap();
    let descriptors = write_json(
        &dir,
        "descriptors.json",
        &json!([
            { "uuid": "1", "name": "authority", "type": "data", "contentType": "object",
              "properties": { "label": "Authority", "required": true, "list": true },
              "content": [
                  { "data": { "id": 1, "name": "ra1" }, "reference": "ra1" },
                  { "data": { "id": 2, "name": "ra2" }, "reference": "ra2" }
              ] },
            { "uuid": "2", "name": "profile", "type": "data", "contentType": "string",
              "properties": { "label": "Profile", "required": true, "list": true },
              "attributeCallback": { "mappings": [
                  { "from": "authority.id", "to": "authorityId", "targets": ["pathVariable"] }
              ] } }
        ]),
    );
    let callbacks = write_json(
        &dir,
        "callbacks.json",
        &json!({ "profile": [
            { "data": "e1", "reference": "EE1" },
            { "data": "e2", "reference": "EE2" }
        ] }),
    );
    let form = write_json(
        &dir,
        "form.json",
        &json!({ "authority": "ra1", "profile": "EE2" }),
    );
    let output = attrform()
        .args([
            "--output",
            "json",
            "collect",
            descriptors.to_str().unwrap(),
            "--form",
            form.to_str().unwrap(),
            "--callbacks",
            callbacks.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let requests: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        requests,
        json!([
            { "name": "authority",
              "content": [{ "data": { "id": 1, "name": "ra1" }, "reference": "ra1" }] },
            { "name": "profile",
              "content": [{ "data": "e2", "reference": "EE2" }] }
        ])
    );
}

#[test]
fn collect_defers_values_for_injected_attributes() {
    let dir = TempDir::new().unwrap();
    let descriptors = write_json(
        &dir,
        "descriptors.json",
        &json!([
            { "uuid": "1", "name": "mode", "type": "data", "contentType": "string" },
            { "uuid": "2", "name": "details", "type": "group", "contentType": "object",
              "attributeCallback": { "mappings": [
                  { "from": "mode", "to": "mode", "targets": ["body"] }
              ] } }
        ]),
    );
    let callbacks = write_json(
        &dir,
        "callbacks.json",
        &json!({ "details": [
            { "uuid": "n1", "name": "extra", "type": "data", "contentType": "string",
              "properties": { "label": "Extra" } }
        ] }),
    );
    let form = write_json(
        &dir,
        "form.json",
        &json!({ "extra": "custom", "mode": "b" }),
    );
    attrform()
        .args([
            "collect",
            descriptors.to_str().unwrap(),
            "--form",
            form.to_str().unwrap(),
            "--callbacks",
            callbacks.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("mode = [{\"data\":\"b\"}]"))
        .stdout(predicate::str::contains("extra = [{\"data\":\"custom\"}]"));
}

#[test]
fn collect_adds_optional_custom_attribute_from_form() {
    let dir = TempDir::new().unwrap();
    let descriptors = write_json(
        &dir,
        "descriptors.json",
        &json!([
            { "uuid": "1", "name": "url", "type": "data", "contentType": "string",
              "properties": { "label": "URL", "required": true } },
            { "uuid": "2", "name": "department", "type": "custom", "contentType": "string",
              "properties": { "label": "Department" } }
        ]),
    );
    let form = write_json(
        &dir,
        "form.json",
        &json!({ "url": "https://ca.example.com", "department": "PKI" }),
    );
    attrform()
        .args([
            "collect",
            descriptors.to_str().unwrap(),
            "--form",
            form.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("department = [{\"data\":\"PKI\"}]"));
}

#[test]
fn collect_accepts_full_field_paths() {
    let dir = TempDir::new().unwrap();
    let descriptors = write_json(
        &dir,
        "descriptors.json",
        &json!([{ "uuid": "1", "name": "script", "type": "data", "contentType": "codeblock" }]),
    );
    let form = write_json(
        &dir,
        "form.json",
        &json!({
            "__attributes__ns__.script.codeTextArea": "echo hi",
            "__attributes__ns__.script.language": "shell"
        }),
    );
    attrform()
        .args([
            "--namespace",
            "ns",
            "collect",
            descriptors.to_str().unwrap(),
            "--form",
            form.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"code\":\"ZWNobyBoaQ==\""))
        .stdout(predicate::str::contains("\"language\":\"shell\""));
}
