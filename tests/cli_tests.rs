//! End-to-end tests for the `refinfer` binary.
//!
//! These run the built binary against the diff documents under
//! `crates/refinfer-mapping/tests/fixtures/` and check the JSON contract:
//! `status` first, exit codes, and the inferred refactorings.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

// ============================================================================
// Test Infrastructure
// ============================================================================

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("crates")
        .join("refinfer-mapping")
        .join("tests")
        .join("fixtures")
}

fn fixture(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Run the binary in `cwd` so no stray refinfer.toml is picked up.
fn refinfer(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_refinfer"))
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run refinfer")
}

fn stdout_json(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("invalid JSON ({e}):\n{stdout}"))
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("non-UTF-8 path")
}

// ============================================================================
// infer
// ============================================================================

#[test]
fn infer_reports_extracted_variable() {
    let temp = TempDir::new().unwrap();
    let doc = fixture("extract_variable.json");
    let output = refinfer(temp.path(), &["infer", path_arg(&doc)]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["schema_version"], "1");
    assert!(json["snapshot_id"].as_str().unwrap().starts_with("snap_"));
    assert_eq!(json["summary"]["mappings"], 3);
    assert_eq!(json["summary"]["extract_variable"], 1);
    assert_eq!(json["summary"]["inline_variable"], 0);

    let refactoring = &json["refactorings"][0];
    assert_eq!(refactoring["type"], "Extract Variable");
    assert_eq!(refactoring["variable"], "base : int");
    assert_eq!(refactoring["references"], 1);
    assert_eq!(refactoring["sub_expression_mappings"][0]["before"], "item.price()");

    let mapping = &json["mappings"][1];
    assert_eq!(mapping["identical_with_extracted_variable"], true);
    assert_eq!(
        mapping["refactorings"][0],
        "Extract Variable base : int in method total(Item item) from class shop.Pricing"
    );
}

#[test]
fn infer_status_is_first_field() {
    let temp = TempDir::new().unwrap();
    let doc = fixture("inline_variable.json");
    let output = refinfer(temp.path(), &["infer", path_arg(&doc)]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.trim_start().starts_with("{\n  \"status\": \"ok\""));
    assert_eq!(stdout_json(&output)["refactorings"][0]["type"], "Inline Variable");
}

#[test]
fn infer_text_format() {
    let temp = TempDir::new().unwrap();
    let doc = fixture("extract_variable.json");
    let output = refinfer(temp.path(), &["--format", "text", "infer", path_arg(&doc)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3 mappings (2 exact), 1 extract, 0 inline"));
    assert!(stdout.contains("  Extract Variable base : int in method total(Item item)"));
}

#[test]
fn infer_dir_emits_one_line_per_document() {
    let temp = TempDir::new().unwrap();
    let docs = temp.path().join("docs");
    fs::create_dir(&docs).unwrap();
    for name in ["extract_variable.json", "inline_variable.json"] {
        fs::copy(fixture(name), docs.join(name)).unwrap();
    }
    let output = refinfer(temp.path(), &["infer", "--dir", path_arg(&docs)]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["summary"]["extract_variable"], 1);
    assert_eq!(lines[1]["summary"]["inline_variable"], 1);
}

#[test]
fn config_file_marks_refactorings_inside_extracted_method() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("refinfer.toml"),
        "[inference]\ninside_extracted_or_inlined_method = true\n",
    )
    .unwrap();
    let doc = fixture("extract_variable.json");
    let output = refinfer(temp.path(), &["infer", path_arg(&doc)]);
    let json = stdout_json(&output);
    assert_eq!(json["refactorings"][0]["inside_extracted_or_inlined_method"], true);
}

// ============================================================================
// mappings
// ============================================================================

#[test]
fn mappings_lists_node_mappings_in_order() {
    let temp = TempDir::new().unwrap();
    let doc = fixture("rename_parameter.json");
    let output = refinfer(temp.path(), &["mappings", path_arg(&doc)]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(
        json["mappings"],
        serde_json::json!([
            "SingleVariableDeclaration [3886,3897] -> SingleVariableDeclaration [2778,2797]",
            "PrimitiveType: long [3886,3890] -> PrimitiveType: long [2778,2782]",
            "SimpleName: millis [3891,3897] -> SimpleName: durationMillis [2783,2797]",
        ])
    );
}

#[test]
fn mappings_src_filter_holds_duplicate_once() {
    let temp = TempDir::new().unwrap();
    let doc = fixture("duplicate_return.json");
    let output = refinfer(
        temp.path(),
        &["mappings", path_arg(&doc), "--src", "ReturnStatement [17511,17714]"],
    );
    let json = stdout_json(&output);
    assert_eq!(json["mappings"].as_array().unwrap().len(), 1);
}

#[test]
fn mappings_src_filter_lists_each_target() {
    let temp = TempDir::new().unwrap();
    let doc = fixture("return_two_targets.json");
    let output = refinfer(
        temp.path(),
        &["mappings", path_arg(&doc), "--src", "ReturnStatement [17511,17714]"],
    );
    let json = stdout_json(&output);
    assert_eq!(
        json["mappings"],
        serde_json::json!([
            "ReturnStatement [17511,17714] -> ReturnStatement [17511,17714]",
            "ReturnStatement [17511,17714] -> ReturnStatement [18002,18205]",
        ])
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn missing_document_exits_with_resolution_code() {
    let temp = TempDir::new().unwrap();
    let output = refinfer(temp.path(), &["infer", "absent.json"]);
    assert_eq!(output.status.code(), Some(3));
    let json = stdout_json(&output);
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["code"], 3);
    assert_eq!(json["error"]["details"]["path"], "absent.json");
}

#[test]
fn dir_naming_a_file_exits_with_invalid_arguments_code() {
    let temp = TempDir::new().unwrap();
    let doc = fixture("extract_variable.json");
    let output = refinfer(temp.path(), &["infer", "--dir", path_arg(&doc)]);
    assert_eq!(output.status.code(), Some(2));
    let json = stdout_json(&output);
    assert_eq!(json["error"]["code"], 2);
    assert_eq!(json["error"]["details"]["path"], path_arg(&doc));
}

#[test]
fn dangling_fragment_id_is_a_resolution_error() {
    let temp = TempDir::new().unwrap();
    let doc = temp.path().join("dangling.json");
    fs::write(
        &doc,
        r#"{ "operations": [ { "id": 0, "name": "m", "class_name": "A" } ],
             "mappings": [ { "fragment1": 0, "fragment2": 1, "operation1": 0, "operation2": 0 } ] }"#,
    )
    .unwrap();
    let output = refinfer(temp.path(), &["infer", path_arg(&doc)]);
    assert_eq!(output.status.code(), Some(3));
    let json = stdout_json(&output);
    assert_eq!(json["error"]["details"]["path"], path_arg(&doc));
}

#[test]
fn malformed_document_exits_with_invalid_arguments_code() {
    let temp = TempDir::new().unwrap();
    let doc = temp.path().join("bad.json");
    fs::write(&doc, "[1, 2").unwrap();
    let output = refinfer(temp.path(), &["infer", path_arg(&doc)]);
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout_json(&output)["status"], "error");
}

#[test]
fn bad_config_is_reported() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("refinfer.toml"), "[output\n").unwrap();
    let doc = fixture("extract_variable.json");
    let output = refinfer(temp.path(), &["infer", path_arg(&doc)]);
    assert_eq!(output.status.code(), Some(2));
}
