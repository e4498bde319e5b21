//! CLI smoke tests against an in-memory database

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_stats_on_empty_database() {
    Command::cargo_bin("commgraph")
        .unwrap()
        .args(["--memory", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("People: 0"));
}

#[test]
fn test_import_csv_skips_unparseable_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv_path = dir.path().join("dump.csv");
    std::fs::write(
        &csv_path,
        "email_text\n\
         \"From: Alice Chen <alice@example.com>\nTo: bob@example.com\n\"\n\
         \"just some prose with no headers\"\n",
    )
    .expect("write csv");

    // The prose record cannot be parsed; the import counts it as
    // skipped and still applies the parseable one.
    Command::cargo_bin("commgraph")
        .unwrap()
        .args(["--memory", "import-csv"])
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "1 identity upserts, 1 edge upserts, 1 skipped",
        ));
}

#[test]
fn test_aliases_writes_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv_path = dir.path().join("dump.csv");
    let out_path = dir.path().join("aliases.json");
    std::fs::write(
        &csv_path,
        "email_text\n\"From: Alice Chen <alice@example.com>\nTo: bob@example.com\n\"\n",
    )
    .expect("write csv");

    Command::cargo_bin("commgraph")
        .unwrap()
        .arg("aliases")
        .arg(&csv_path)
        .arg("--output")
        .arg(&out_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved 1 unique aliases"));

    let json = std::fs::read_to_string(&out_path).expect("read table");
    assert!(json.contains("Alice Chen"));
}
