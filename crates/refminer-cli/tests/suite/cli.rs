use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use refminer_diff::ClassDiffInput;
use refminer_model::{AlignmentKind, OperationId, PrecomputedAligner, PrecomputedAlignment};
use refminer_test_utils::{to_json_pretty, ClassBuilder, FragmentBuilder as F, MapperBuilder, OperationBuilder};
use tempfile::TempDir;

fn refminer() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("refminer"))
}

/// `before()` moves two statements into `helper()`, with the alignment of
/// the two shipped in the document.
fn extraction_document() -> ClassDiffInput {
    let original = ClassBuilder::new("A")
        .operation(
            OperationBuilder::new(1, "before")
                .statement(F::leaf(1, "a();"))
                .statement(F::leaf(2, "log(y);"))
                .statement(F::leaf(3, "save(y);")),
        )
        .build();
    let next = ClassBuilder::new("A")
        .operation(
            OperationBuilder::new(2, "before")
                .statement(F::leaf(11, "a();"))
                .statement(F::leaf(12, "helper();").call("helper", &[])),
        )
        .operation(
            OperationBuilder::new(4, "helper")
                .statement(F::leaf(41, "log(y);"))
                .statement(F::leaf(42, "save(y);")),
        )
        .build();
    let mut input = ClassDiffInput::new(original, next);
    input.mappers.push(
        MapperBuilder::new(1, 2)
            .map(F::leaf(1, "a();"), F::leaf(11, "a();"))
            .unmapped1(F::leaf(2, "log(y);"))
            .unmapped1(F::leaf(3, "save(y);"))
            .unmapped2(F::leaf(12, "helper();").call("helper", &[]))
            .build(),
    );
    input.alignments = PrecomputedAligner::new(vec![PrecomputedAlignment {
        kind: AlignmentKind::Extract,
        container1: OperationId(1),
        container2: OperationId(4),
        invocation: None,
        mapper: MapperBuilder::new(1, 4)
            .map(F::leaf(2, "log(y);"), F::leaf(41, "log(y);"))
            .map(F::leaf(3, "save(y);"), F::leaf(42, "save(y);"))
            .build(),
    }]);
    input
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

#[test]
fn help_mentions_commands() {
    refminer()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("detect").and(predicate::str::contains("schema")));
}

#[test]
fn detect_prints_facts_as_text() {
    let temp = TempDir::new().expect("tempdir");
    let input = write(temp.path(), "diff.json", &to_json_pretty(&extraction_document()));

    refminer()
        .arg("detect")
        .arg(&input)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("A -> A")
                .and(predicate::str::contains("Extract Method helper() extracted from before() in class A")),
        );
}

#[test]
fn detect_json_lists_refactorings() {
    let temp = TempDir::new().expect("tempdir");
    let input = write(temp.path(), "diff.json", &to_json_pretty(&extraction_document()));

    let output = refminer().arg("detect").arg(&input).arg("--json").output().expect("run refminer");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(v["original_class"], "A");
    let refactorings = v["refactorings"].as_array().expect("refactorings");
    assert_eq!(refactorings.len(), 1);
    assert_eq!(refactorings[0]["type"], "extract_operation");
    assert_eq!(refactorings[0]["extracted"]["signature"], "helper()");
    assert!(v["added_operations"].as_array().expect("added operations").is_empty());
}

#[test]
fn zero_timeout_exits_with_code_two() {
    let temp = TempDir::new().expect("tempdir");
    let input = write(temp.path(), "diff.json", &to_json_pretty(&extraction_document()));

    refminer()
        .arg("detect")
        .arg(&input)
        .args(["--timeout-ms", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("timed out"));
}

#[test]
fn config_file_switches_passes_off() {
    let temp = TempDir::new().expect("tempdir");
    let input = write(temp.path(), "diff.json", &to_json_pretty(&extraction_document()));
    let config = write(
        temp.path(),
        "refminer.toml",
        "[detection]\nextract_operations = false\nextract_with_calls_in_other_mappers = false\n\n[logging]\nstderr = false\n",
    );

    refminer()
        .arg("detect")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("no refactorings").and(predicate::str::contains("added operations: helper()")));
}

#[test]
fn malformed_document_is_reported() {
    let temp = TempDir::new().expect("tempdir");
    let input = write(temp.path(), "diff.json", "{ \"original\": 1 }");

    refminer()
        .arg("detect")
        .arg(&input)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to parse class-diff document"));
}

#[test]
fn unknown_config_key_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let input = write(temp.path(), "diff.json", &to_json_pretty(&extraction_document()));
    let config = write(temp.path(), "refminer.toml", "[detection]\nextract_everything = true\n");

    refminer()
        .arg("detect")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn schema_describes_both_sections() {
    let output = refminer().arg("schema").output().expect("run refminer");

    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("schema json");
    assert!(v["properties"]["detection"].is_object());
    assert!(v["properties"]["logging"].is_object());
}
