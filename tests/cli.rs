//! Integration tests driving the `patchwork` binary end-to-end, in the
//! teacher's `assert_cmd` style (see `tests/test_add_sub_directory_file.rs`
//! in the retrieval pack).

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use tempfile::tempdir;

fn patchwork_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("patchwork"))
}

#[test]
fn applies_single_line_replace_with_strip() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("t"), "Hello World\n").unwrap();
    let patch_path = dir.path().join("p.diff");
    fs::write(
        &patch_path,
        "--- a/t\n+++ b/t\n@@ -1 +1 @@\n-Hello World\n+Hello Python Patch!\n",
    )
    .unwrap();

    patchwork_cmd()
        .current_dir(dir.path())
        .arg(&patch_path)
        .arg("-p1")
        .assert()
        .success();

    assert_eq!(
        fs::read(dir.path().join("t")).unwrap(),
        b"Hello Python Patch!\n"
    );
}

#[test]
fn revert_restores_original_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("t"), "Hello Python Patch!\n").unwrap();
    let patch_path = dir.path().join("p.diff");
    fs::write(
        &patch_path,
        "--- a/t\n+++ b/t\n@@ -1 +1 @@\n-Hello World\n+Hello Python Patch!\n",
    )
    .unwrap();

    patchwork_cmd()
        .current_dir(dir.path())
        .arg(&patch_path)
        .arg("-p1")
        .arg("--revert")
        .assert()
        .success();

    assert_eq!(fs::read(dir.path().join("t")).unwrap(), b"Hello World\n");
}

#[test]
fn dry_run_leaves_file_untouched() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("t"), "Hello World\n").unwrap();
    let patch_path = dir.path().join("p.diff");
    fs::write(
        &patch_path,
        "--- a/t\n+++ b/t\n@@ -1 +1 @@\n-Hello World\n+Hello Python Patch!\n",
    )
    .unwrap();

    patchwork_cmd()
        .current_dir(dir.path())
        .arg(&patch_path)
        .arg("-p1")
        .arg("--dry-run")
        .assert()
        .success();

    assert_eq!(fs::read(dir.path().join("t")).unwrap(), b"Hello World\n");
}

#[test]
fn diffstat_prints_histogram_without_applying() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("t"), "line1\nline2\nline3\n").unwrap();
    let patch_path = dir.path().join("p.diff");
    fs::write(
        &patch_path,
        "--- a/t\n+++ b/t\n@@ -1,3 +1,4 @@\n line1\n+inserted\n line2\n line3\n",
    )
    .unwrap();

    let output = patchwork_cmd()
        .current_dir(dir.path())
        .arg(&patch_path)
        .arg("--diffstat")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("t | 1 +"), "got: {text}");
    assert_eq!(
        fs::read(dir.path().join("t")).unwrap(),
        b"line1\nline2\nline3\n"
    );
}

#[test]
fn missing_patch_source_exits_unreadable_input() {
    let dir = tempdir().unwrap();
    patchwork_cmd()
        .current_dir(dir.path())
        .arg("does-not-exist.diff")
        .assert()
        .code(2);
}

#[test]
fn conflicting_hunk_exits_apply_failure() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("t"), "completely different contents\n").unwrap();
    let patch_path = dir.path().join("p.diff");
    fs::write(
        &patch_path,
        "--- a/t\n+++ b/t\n@@ -1 +1 @@\n-Hello World\n+Hello Python Patch!\n",
    )
    .unwrap();

    patchwork_cmd()
        .current_dir(dir.path())
        .arg(&patch_path)
        .arg("-p1")
        .assert()
        .code(1);

    // file left untouched on conflict
    assert_eq!(
        fs::read(dir.path().join("t")).unwrap(),
        b"completely different contents\n"
    );
}

#[test]
fn missing_positional_argument_exits_argument_error() {
    patchwork_cmd().assert().code(5);
}

#[test]
fn config_file_supplies_default_strip() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("t"), "Hello World\n").unwrap();
    fs::write(dir.path().join(".patchworkrc.toml"), "strip = 1\n").unwrap();
    let patch_path = dir.path().join("p.diff");
    fs::write(
        &patch_path,
        "--- a/t\n+++ b/t\n@@ -1 +1 @@\n-Hello World\n+Hello Python Patch!\n",
    )
    .unwrap();

    patchwork_cmd()
        .current_dir(dir.path())
        .arg(&patch_path)
        .assert()
        .success();

    assert_eq!(
        fs::read(dir.path().join("t")).unwrap(),
        b"Hello Python Patch!\n"
    );
}
