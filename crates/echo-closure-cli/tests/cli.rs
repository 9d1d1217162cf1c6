// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end runs of the `closure-gen` binary.
#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CHAIN: &str = "\
{\"parent_id\": 1, \"child_id\": 2}
{\"parent_id\": 2, \"child_id\": 3}
";

fn closure_gen() -> Command {
    let mut cmd = Command::cargo_bin("closure-gen").unwrap();
    cmd.env("RUST_LOG", "warn");
    cmd
}

fn write_input(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("edges.jsonl");
    fs::write(&path, body).unwrap();
    path
}

fn triples(stdout: &[u8]) -> BTreeSet<(i64, i64, i64)> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| {
            let v: serde_json::Value = serde_json::from_str(line).unwrap();
            (
                v["parent_id"].as_i64().unwrap(),
                v["child_id"].as_i64().unwrap(),
                v["distance"].as_i64().unwrap(),
            )
        })
        .collect()
}

fn run_ok(args: &[&str], input: &Path) -> BTreeSet<(i64, i64, i64)> {
    let out = closure_gen()
        .arg("run")
        .arg("--input")
        .arg(input)
        .args(args)
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    triples(&out.stdout)
}

#[test]
fn run_emits_the_closure_as_json_lines() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, CHAIN);
    let got = run_ok(&[], &input);
    assert_eq!(got, [(1, 2, 1), (2, 3, 1), (1, 3, 2)].into());
}

#[test]
fn root_id_zero_adds_root_row() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, CHAIN);
    let got = run_ok(&["--root-id-zero"], &input);
    assert!(got.contains(&(1, 1, 0)));
    assert_eq!(got.len(), 4);
}

#[test]
fn renamed_fields_are_honored() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "{\"up\": \"a\", \"down\": \"b\"}\n");
    closure_gen()
        .args(["run", "--parent-field", "up", "--child-field", "down"])
        .args(["--distance-field", "hops", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout("{\"up\":\"a\",\"down\":\"b\",\"hops\":1}\n");
}

#[test]
fn table_format_renders_header() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, CHAIN);
    closure_gen()
        .args(["run", "--format", "table", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("parent_id").and(predicate::str::contains("distance")));
}

#[test]
fn missing_field_fails_before_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, CHAIN);
    closure_gen()
        .args(["run", "--parent-field", "nope", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn abort_policy_fails_on_null_id() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "{\"parent_id\": 1, \"child_id\": 2}\n{\"parent_id\": null, \"child_id\": 3}\n",
    );
    closure_gen()
        .args(["run", "--on-malformed", "abort", "--input"])
        .arg(&input)
        .assert()
        .failure();

    let got = run_ok(&["--on-malformed", "skip"], &input);
    assert_eq!(got, [(1, 2, 1)].into());
}

#[test]
fn saved_profile_is_reused() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("profiles");
    let input = write_input(&dir, CHAIN);
    let config_arg = config.to_str().unwrap();

    run_ok(
        &["--root-id-zero", "--config-dir", config_arg, "--save-profile", "tree"],
        &input,
    );
    assert!(config.join("tree.json").exists());

    let got = run_ok(&["--config-dir", config_arg, "--profile", "tree"], &input);
    assert!(got.contains(&(1, 1, 0)));
}

#[test]
fn unknown_profile_is_an_error() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, CHAIN);
    closure_gen()
        .args(["run", "--profile", "ghost", "--config-dir"])
        .arg(dir.path())
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn check_reports_each_field() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, CHAIN);
    closure_gen()
        .args(["check", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ok:").and(predicate::str::contains("error").not()));

    closure_gen()
        .args(["check", "--child-field", "kid", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("error:"));
}

#[test]
fn ids_beyond_i64_are_kept_exact() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "{\"parent_id\": 9223372036854775809, \"child_id\": 9223372036854775810}\n\
         {\"parent_id\": 9223372036854775811, \"child_id\": 9223372036854775812}\n",
    );
    let out = closure_gen()
        .args(["run", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success());
    let lines: BTreeSet<String> = String::from_utf8_lossy(&out.stdout)
        .lines()
        .map(str::to_owned)
        .collect();
    let want: BTreeSet<String> = [
        "{\"parent_id\":\"9223372036854775809\",\"child_id\":\"9223372036854775810\",\"distance\":1}",
        "{\"parent_id\":\"9223372036854775811\",\"child_id\":\"9223372036854775812\",\"distance\":1}",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect();
    assert_eq!(lines, want);
}

#[test]
fn stdin_input_is_supported() {
    closure_gen()
        .args(["run", "--input", "-"])
        .write_stdin(CHAIN)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"distance\":2"));
}
