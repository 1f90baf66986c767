//! Integration tests for the cwlforge CLI
//!
//! These tests run the actual CLI binary and verify output.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Get the binary to test
fn cwlforge_cmd() -> Command {
    Command::cargo_bin("cwlforge").unwrap()
}

fn write_doc(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const TOOL: &str = r#"
cwlVersion: v1.0
class: CommandLineTool
id: wc
baseCommand: [wc, -l]
inputs:
  file:
    type: File
    inputBinding:
      position: 1
outputs:
  count:
    type: stdout
stdout: count.txt
"#;

const WORKFLOW: &str = r#"
cwlVersion: v1.0
class: Workflow
id: count_lines
inputs:
  file: File
outputs:
  count:
    type: File
    outputSource: wc/count
steps:
  wc:
    run:
      class: CommandLineTool
      id: wc
      baseCommand: [wc, -l]
      inputs:
        file: File
      outputs:
        count:
          type: File
          outputBinding:
            glob: count.txt
    in:
      file: file
    out: [count]
"#;

const BROKEN_WORKFLOW: &str = r#"
cwlVersion: v1.0
class: Workflow
id: broken
inputs:
  file: File
outputs:
  count:
    type: File
    outputSource: missing/count
steps:
  wc:
    run: wc.cwl
    in:
      file: nowhere
    out: [count]
"#;

// ============================================================================
// Help
// ============================================================================

#[test]
fn test_help_flag() {
    cwlforge_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("convert"));
}

#[test]
fn test_convert_help() {
    cwlforge_cmd()
        .args(["convert", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("--output"));
}

// ============================================================================
// Validate
// ============================================================================

#[test]
fn test_validate_tool() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_doc(&temp_dir, "wc.cwl", TOOL);

    cwlforge_cmd()
        .arg("validate")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("CommandLineTool 'wc' is valid"));
}

#[test]
fn test_validate_workflow() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_doc(&temp_dir, "count.cwl", WORKFLOW);

    cwlforge_cmd()
        .arg("validate")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Workflow 'count_lines' is valid (1 steps)"));
}

#[test]
fn test_validate_broken_workflow() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_doc(&temp_dir, "broken.cwl", BROKEN_WORKFLOW);

    cwlforge_cmd()
        .arg("validate")
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("missing/count"))
        .stdout(predicate::str::contains("nowhere"))
        .stdout(predicate::str::contains("has 2 error(s)"));
}

#[test]
fn test_validate_missing_file() {
    cwlforge_cmd()
        .args(["validate", "/nonexistent/workflow.cwl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("CWL-020"));
}

#[test]
fn test_validate_unknown_class() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_doc(&temp_dir, "odd.cwl", "cwlVersion: v1.0\nclass: Operation\ninputs: []\noutputs: []\n");

    cwlforge_cmd()
        .arg("validate")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

// ============================================================================
// Inspect / Hash / Convert
// ============================================================================

#[test]
fn test_inspect_workflow() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_doc(&temp_dir, "count.cwl", WORKFLOW);

    cwlforge_cmd()
        .arg("inspect")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Workflow"))
        .stdout(predicate::str::contains("Inputs:"))
        .stdout(predicate::str::contains("file: File"))
        .stdout(predicate::str::contains("wc → CommandLineTool"));
}

#[test]
fn test_hash_is_stable_across_formats() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_doc(&temp_dir, "wc.cwl", TOOL);
    let json = temp_dir.path().join("wc.json");

    let yaml_hash = cwlforge_cmd().arg("hash").arg(&file).assert().success().get_output().stdout.clone();
    let yaml_hash = String::from_utf8(yaml_hash).unwrap();
    assert_eq!(yaml_hash.trim().len(), 16);
    assert!(yaml_hash.trim().chars().all(|c| c.is_ascii_hexdigit()));

    cwlforge_cmd().arg("convert").arg(&file).arg("-o").arg(&json).assert().success();
    cwlforge_cmd()
        .arg("hash")
        .arg(&json)
        .assert()
        .success()
        .stdout(predicate::str::contains(yaml_hash.trim()));
}

#[test]
fn test_convert_to_json_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_doc(&temp_dir, "count.cwl", WORKFLOW);
    let out = temp_dir.path().join("out/count.json");

    cwlforge_cmd()
        .arg("convert")
        .arg(&file)
        .args(["--format", "json", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["class"], "Workflow");
    assert_eq!(value["steps"][0]["id"], "wc");
}

#[test]
fn test_convert_to_stdout() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_doc(&temp_dir, "wc.cwl", TOOL);

    cwlforge_cmd()
        .arg("convert")
        .arg(&file)
        .args(["-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"class\": \"CommandLineTool\""));
}
