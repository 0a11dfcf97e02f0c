//! Integration tests for the cellwise binary.

use std::path::Path;
use std::process::Command;

fn run(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_cellwise"))
        // Tests must not depend on a user's ~/.config/cellwise/config.toml.
        .arg("--no-config")
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute cellwise");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn write_sheet(dir: &Path, content: &str) -> String {
    let path = dir.join("sheet.csv");
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_basic_arithmetic() {
    let (stdout, _, code) = run(&["-c", "2+3*4"]);
    assert_eq!(stdout.trim(), "14");
    assert_eq!(code, 0);
}

#[test]
fn test_auto_prepend_equals() {
    let (stdout1, _, _) = run(&["-c", "10-2-3"]);
    let (stdout2, _, _) = run(&["-c", "=10-2-3"]);
    assert_eq!(stdout1, stdout2);
    assert_eq!(stdout1.trim(), "5");
}

#[test]
fn test_division_by_zero_exit_code() {
    let (stdout, _, code) = run(&["-c", "1/0"]);
    assert_eq!(stdout.trim(), "#DIV/0!");
    assert_eq!(code, 1);
}

#[test]
fn test_formula_against_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = write_sheet(dir.path(), "1,2\n3,4\n");
    let (stdout, _, code) = run(&[sheet.as_str(), "-c", "SUM(B2:A1)"]);
    assert_eq!(stdout.trim(), "10");
    assert_eq!(code, 0);
}

#[test]
fn test_single_cell() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = write_sheet(dir.path(), "5,=A1+1\n=B2,=A2\n");
    let (stdout, _, code) = run(&[sheet.as_str(), "--cell", "B1"]);
    assert_eq!(stdout.trim(), "6");
    assert_eq!(code, 0);

    let (stdout, _, _) = run(&[sheet.as_str(), "--cell", "b2"]);
    assert_eq!(stdout.trim(), "#CIRC!");
}

#[test]
fn test_invalid_cell_label() {
    let (_, stderr, code) = run(&["--cell", "1A"]);
    assert!(stderr.contains("Invalid cell reference"));
    assert_eq!(code, 1);
}

#[test]
fn test_prints_markdown_grid() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = write_sheet(dir.path(), "1,=A1*2\n");
    let (stdout, _, code) = run(&[sheet.as_str()]);
    assert!(stdout.contains("| A | B |"));
    assert!(stdout.contains("| 1 | 1 | 2 |"));
    assert_eq!(code, 0);
}

#[test]
fn test_export_csv() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = write_sheet(dir.path(), "4,=A1/2,hello\n");
    let out = dir.path().join("out.csv");
    let (_, _, code) = run(&[sheet.as_str(), "-o", out.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "4,2,hello\n");
}

#[test]
fn test_missing_file_fails() {
    let (_, stderr, code) = run(&["/definitely/not/here.csv"]);
    assert!(stderr.contains("Failed to load"));
    assert_eq!(code, 1);
}
