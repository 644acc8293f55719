// Command-line tests for the draftsman binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const INVOICE: &str =
    "class Invoice extends Document { private String id; public String getId() { return id; } }";

fn draftsman(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("draftsman").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    draftsman(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("draftsman "));
}

#[test]
fn test_combinations() {
    let dir = TempDir::new().unwrap();
    draftsman(&dir)
        .arg("combinations")
        .assert()
        .success()
        .stdout(predicate::str::contains("java+class"))
        .stdout(predicate::str::contains("any+package"))
        .stdout(predicate::str::contains("any+class").not());
}

#[test]
fn test_convert_to_stdout() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Invoice.java"), INVOICE).unwrap();

    draftsman(&dir)
        .args(["convert", "Invoice.java"])
        .assert()
        .success()
        .stdout(predicate::str::contains("@startuml"))
        .stdout(predicate::str::contains("Document <|-- Invoice"));
}

#[test]
fn test_convert_to_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Invoice.java"), INVOICE).unwrap();

    draftsman(&dir)
        .args(["convert", "Invoice.java", "-k", "class", "-k", "sequence", "-o", "out"])
        .assert()
        .success();

    let class = fs::read_to_string(dir.path().join("out/Invoice.class.puml")).unwrap();
    assert!(class.contains("- id : String"));
    assert!(dir.path().join("out/Invoice.sequence.puml").exists());
}

#[test]
fn test_convert_json_format() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Invoice.java"), INVOICE).unwrap();

    draftsman(&dir)
        .args(["convert", "Invoice.java", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"class\""));
}

#[test]
fn test_convert_stdin() {
    let dir = TempDir::new().unwrap();
    draftsman(&dir)
        .args(["convert", "-", "--language", "python"])
        .write_stdin("class Square(Shape):\n    pass\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Shape <|-- Square"));
}

#[test]
fn test_convert_reports_bad_kind() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Invoice.java"), INVOICE).unwrap();

    draftsman(&dir)
        .args(["convert", "Invoice.java", "-k", "class", "-k", "bogus_kind"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Document <|-- Invoice"))
        .stderr(predicate::str::contains("Unsupported combination"));
}

#[test]
fn test_convert_unknown_extension() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.txt"), "hello").unwrap();

    draftsman(&dir)
        .args(["convert", "notes.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot infer language"));
}

#[test]
fn test_convert_missing_file() {
    let dir = TempDir::new().unwrap();
    draftsman(&dir)
        .args(["convert", "Missing.java"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Path not found"));
}

#[test]
fn test_config_file_kinds() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Invoice.java"), INVOICE).unwrap();
    fs::write(
        dir.path().join("draftsman.toml"),
        "[engine]\nkinds = [\"activity\"]\n\n[render]\nstyle = false\n",
    )
    .unwrap();

    draftsman(&dir)
        .args(["convert", "Invoice.java"])
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("skinparam").not());
}

#[test]
fn test_invalid_explicit_config() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Invoice.java"), INVOICE).unwrap();
    fs::write(dir.path().join("bad.toml"), "[engine]\nkinds = []\n").unwrap();

    draftsman(&dir)
        .args(["convert", "Invoice.java", "--config", "bad.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config validation error"));
}

#[test]
fn test_scan_package_diagram() {
    let dir = TempDir::new().unwrap();
    let project = dir.path().join("project");
    fs::create_dir_all(project.join("src/services")).unwrap();
    fs::create_dir_all(project.join("src/models")).unwrap();
    fs::write(project.join("src/services/OrderService.java"), "class OrderService { }").unwrap();
    fs::write(project.join("src/models/Order.java"), "class Order { }").unwrap();

    draftsman(&dir)
        .args(["scan", "project"])
        .assert()
        .success()
        .stdout(predicate::str::contains("package \"src.services\" as src_services"))
        .stdout(predicate::str::contains("package \"src.models\" as src_models"));

    draftsman(&dir)
        .args(["scan", "project", "--listing"])
        .assert()
        .success()
        .stdout("src/models/Order.java\nsrc/services/OrderService.java\n");
}

#[test]
fn test_scan_missing_directory() {
    let dir = TempDir::new().unwrap();
    draftsman(&dir)
        .args(["scan", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Path not found"));
}

#[test]
fn test_model_command() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Invoice.java"), INVOICE).unwrap();

    draftsman(&dir)
        .args(["model", "Invoice.java"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"class\""))
        .stdout(predicate::str::contains("\"name\": \"Invoice\""));
}
