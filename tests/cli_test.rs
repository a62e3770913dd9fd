//! CLI integration tests.
//!
//! Tests:
//! - Help and version output
//! - Replaying an operation log file into a database
//! - Non-zero exit on a malformed log

mod common;

use common::TestFixture;
use rusqlite::Connection;
use std::process::Command;

fn rowbatch() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rowbatch"))
}

#[test]
fn test_cli_help_output() {
    let output = rowbatch().arg("--help").output().expect("failed to run");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--db"), "help should mention --db option");
    assert!(stdout.contains("--input"), "help should mention --input option");
    assert!(
        stdout.contains("--row-limit"),
        "help should mention --row-limit option"
    );
    assert!(
        stdout.contains("--size-limit"),
        "help should mention --size-limit option"
    );
}

#[test]
fn test_cli_version_output() {
    let output = rowbatch().arg("--version").output().expect("failed to run");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "version output should contain version number: {}",
        stdout
    );
}

#[test]
fn test_cli_replays_log_file() {
    let fixture = TestFixture::new();
    let input = fixture.write_file(
        "ops.jsonl",
        concat!(
            r#"{"op":"sql","sql":"CREATE TABLE t (a INTEGER PRIMARY KEY, b TEXT)"}"#,
            "\n",
            r#"{"op":"insert","header":"t (a, b)","template":"?, ?","values":[1,"one"],"key":[1]}"#,
            "\n",
            r#"{"op":"insert","header":"t (a, b)","template":"?, ?","values":[2,"two"],"key":[2]}"#,
            "\n",
            r#"{"op":"insert","header":"t (a, b)","template":"?, ?","#,
            r#""values":[3,"three"],"key":[3]}"#,
            "\n",
            r#"{"op":"delete","table":"t","columns":{"a":2}}"#,
            "\n",
        ),
    );

    let output = rowbatch()
        .args(["--db", fixture.db_path.to_str().unwrap()])
        .args(["--input", input.to_str().unwrap()])
        .args(["--row-limit", "2"])
        .env("RUST_LOG", "error")
        .output()
        .expect("failed to run");

    assert!(
        output.status.success(),
        "replay failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 deletes, 3 inserts"), "unexpected summary: {stdout}");

    let conn = Connection::open(&fixture.db_path).unwrap();
    let keys: Vec<i64> = conn
        .prepare("SELECT a FROM t ORDER BY a")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(keys, vec![1, 3]);
}

#[test]
fn test_cli_fails_on_malformed_log() {
    let fixture = TestFixture::new();
    let input = fixture.write_file("bad.jsonl", "{\"op\":\"explode\"}\n");

    let output = rowbatch()
        .args(["--db", fixture.db_path.to_str().unwrap()])
        .args(["--input", input.to_str().unwrap()])
        .env("RUST_LOG", "error")
        .output()
        .expect("failed to run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 1"), "stderr should name the line: {stderr}");
}
