//! CLI integration tests for the `phpgraph` binary.
//!
//! Uses `assert_cmd` to spawn the binary and verify exit codes, stdout
//! content and stderr content. Sources are written into a fresh temporary
//! directory per test.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper: create a Command for the `phpgraph` binary.
fn phpgraph() -> Command {
    cargo_bin_cmd!("phpgraph")
}

fn write(dir: &Path, name: &str, source: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, source).unwrap();
    path
}

/// A two-file project where the child class is written before its parent.
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "src/Admin.php",
        "<?php\nnamespace Acme;\n\nclass Admin extends User implements \\Stringable\n{\n    public function __toString(): string { return 'admin'; }\n}\n",
    );
    write(
        dir.path(),
        "src/User.php",
        "<?php\nnamespace Acme;\n\nclass User\n{\n    public function name(): string { return ''; }\n}\n\nfunction make(): User { return new User(); }\n",
    );
    write(dir.path(), "src/README.md", "not php\n");
    dir
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    phpgraph()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("PHP source parser"));
}

#[test]
fn version_exits_0() {
    phpgraph()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("phpgraph"));
}

#[test]
fn parse_requires_a_path() {
    phpgraph().arg("parse").assert().failure();
}

// ──────────────────────────────────────────────
// 2. Parse subcommand
// ──────────────────────────────────────────────

#[test]
fn parse_directory_prints_package_index() {
    let dir = project();
    phpgraph()
        .arg("parse")
        .arg(dir.path().join("src"))
        .assert()
        .success()
        .stdout(predicate::str::contains("package Acme"))
        .stdout(predicate::str::contains("  class Acme\\Admin (Admin.php)"))
        .stdout(predicate::str::contains("  class Acme\\User (User.php)"))
        .stdout(predicate::str::contains("  function Acme\\make (User.php)"))
        .stdout(predicate::str::contains("unresolved\n  Stringable"))
        .stdout(predicate::str::contains("parsed 2 file(s), 0 failed"));
}

#[test]
fn parse_json_output_has_index_and_no_failures() {
    let dir = project();
    let output = phpgraph()
        .args(["--output", "json", "parse"])
        .arg(dir.path().join("src"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["parsed"], 2);
    assert_eq!(json["failures"].as_array().unwrap().len(), 0);
    assert_eq!(json["packages"][0]["name"], "Acme");
    let types: Vec<&str> = json["packages"][0]["types"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["Acme\\Admin", "Acme\\User"]);
    assert_eq!(json["unresolved"], serde_json::json!(["Stringable"]));
}

#[test]
fn parse_failure_is_reported_and_remaining_files_still_parse() {
    let dir = project();
    write(dir.path(), "src/Broken.php", "<?php\nclass Broken {\n    function f() {\n");
    phpgraph()
        .arg("parse")
        .arg(dir.path().join("src"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Broken.php: unclosed body"))
        .stdout(predicate::str::contains("class Acme\\User"))
        .stdout(predicate::str::contains("parsed 2 file(s), 1 failed"));
}

#[test]
fn parse_error_location_is_file_line_column() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "bad.php", "<?php\n$a = 1\n$b = 2;\n");
    phpgraph()
        .args(["--quiet", "parse"])
        .arg(&file)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("bad.php:3:1: unexpected token '$b'"));
}

#[test]
fn parse_json_failure_carries_kind_and_location() {
    let dir = TempDir::new().unwrap();
    let file = write(
        dir.path(),
        "orphan.php",
        "<?php class Orphan { function f() { parent::f(); } }",
    );
    let output = phpgraph()
        .args(["--output", "json", "parse"])
        .arg(&file)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let failure = &json["failures"][0];
    assert_eq!(failure["kind"], "invalid_state");
    assert_eq!(failure["line"], 1);
}

#[test]
fn missing_file_is_an_io_failure() {
    let dir = TempDir::new().unwrap();
    phpgraph()
        .arg("parse")
        .arg(dir.path().join("nope.php"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot read source"));
}

#[test]
fn config_file_adds_extensions_and_hides_packages() {
    let dir = project();
    write(dir.path(), "src/legacy.inc", "<?php namespace Legacy; class Old {}\n");
    let config = write(
        dir.path(),
        "phpgraph.toml",
        "extensions = [\"php\", \"inc\"]\nexclude_packages = [\"Acme\"]\n",
    );
    phpgraph()
        .arg("--config")
        .arg(&config)
        .arg("parse")
        .arg(dir.path().join("src"))
        .assert()
        .success()
        .stdout(predicate::str::contains("package Legacy"))
        .stdout(predicate::str::contains("package Acme").not())
        .stdout(predicate::str::contains("parsed 3 file(s), 0 failed"));
}

#[test]
fn bad_config_file_exits_2() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "phpgraph.toml", "fail_fast = \"yes\"\n");
    phpgraph()
        .arg("--config")
        .arg(&config)
        .arg("parse")
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("could not parse"));
}

#[test]
fn verbose_flag_logs_to_stderr() {
    let dir = project();
    phpgraph()
        .args(["-v", "parse"])
        .arg(dir.path().join("src"))
        .assert()
        .success()
        .stderr(predicate::str::contains("parse run finished"));
}

// ──────────────────────────────────────────────
// 3. Dump subcommand
// ──────────────────────────────────────────────

#[test]
fn dump_prints_tree_with_spans() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "one.php", "<?php\nfunction one() { return 1; }\n");
    phpgraph()
        .arg("dump")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("CompilationUnit"))
        .stdout(predicate::str::contains("  Function one [2:1-2:28]"))
        .stdout(predicate::str::contains("ReturnStatement"));
}

#[test]
fn dump_json_lists_tree_lines() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "one.php", "<?php class One {}\n");
    let output = phpgraph()
        .args(["--output", "json", "dump"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json["nodes"].as_u64().unwrap() >= 2);
    assert!(json["tree"][1].as_str().unwrap().starts_with("  Class One"));
}

#[test]
fn dump_unclosed_file_fails() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "foo.php", "<?php class Foo {");
    phpgraph()
        .arg("dump")
        .arg(&file)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unclosed body"));
}
