use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

const ANSWER: &str = "### ICON:Story The Story\nIt **reads** a file.\n\n```rust\nfn main() {}\n```\n";

#[test]
fn test_render_stdin_to_stdout() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("coderead")
        .env("CODEREAD_HOME", dir.path())
        .arg("render")
        .write_stdin(ANSWER)
        .assert()
        .success()
        .stdout(predicate::str::contains("<!DOCTYPE html>"))
        .stdout(predicate::str::contains(r#"data-theme="light""#))
        .stdout(predicate::str::contains("<strong>reads</strong>"))
        .stdout(predicate::str::contains(r#"data-code-index="0""#))
        .stdout(predicate::str::contains("http-equiv").not());
}

#[test]
fn test_render_file_to_output_with_theme() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("answer.md");
    let output = dir.path().join("page").join("answer.html");
    fs::write(&input, ANSWER).unwrap();

    cargo_bin_cmd!("coderead")
        .env("CODEREAD_HOME", dir.path())
        .args(["render", "--theme", "dark", "-o"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let page = fs::read_to_string(&output).unwrap();
    assert!(page.contains(r#"data-theme="dark""#));
    assert!(page.contains(r#"class="copy-btn""#));
    assert!(!page.contains("http-equiv"));
}

#[test]
fn test_render_uses_configured_theme() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "theme = \"dark\"\n").unwrap();

    cargo_bin_cmd!("coderead")
        .env("CODEREAD_HOME", dir.path())
        .arg("render")
        .write_stdin("plain text")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"data-theme="dark""#));
}

#[test]
fn test_render_missing_file_fails() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("coderead")
        .env("CODEREAD_HOME", dir.path())
        .args(["render", "does-not-exist.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("read markdown"));
}
