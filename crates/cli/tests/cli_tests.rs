// End-to-end runs of the cashflow-ods binary.
//
// Run with: cargo test -p cashflow-cli --test cli_tests

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use base64::Engine as _;

const DATASET: &str = r#"{
    "companyName": "Acme Ltd",
    "years": [{"yearNumber": 2025, "description": "2025"}],
    "months": [{"monthNumber": 1, "name": "Jan"}, {"monthNumber": 2, "name": "Feb"}],
    "categories": [
        {"code": "TC1", "name": "Costs", "polarity": "expense", "cashType": "trade", "displayOrder": 1},
        {"code": "NET", "name": "Net", "kind": "total"}
    ],
    "cashCodes": {"TC1": [{"code": "C1", "description": "a"}]},
    "cashCodeValues": [{"cashCode": "C1", "yearNumber": 2025, "monthNumber": 1, "value": 100}],
    "totalCodes": {"NET": ["TC1"]},
    "expressions": [{"code": "PCT", "name": "Share", "template": "[Costs]/[Net]", "format": "Pct1"}]
}"#;

fn cashflow_ods() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cashflow-ods"));
    cmd.env_remove("CASHFLOW_LOCALES_DIR");
    cmd
}

/// Write the dataset and a job pointing at it; returns the job path.
fn write_job(dir: &Path, params: &str) -> std::path::PathBuf {
    let data = dir.join("data.json");
    std::fs::write(&data, DATASET).unwrap();
    let job = dir.join("job.json");
    let payload = format!(
        r#"{{"SqlConnection": {}, "Params": {{"asOf": "2025-06-15T09:30:00Z"{params}}}}}"#,
        serde_json::to_string(data.to_str().unwrap()).unwrap()
    );
    std::fs::write(&job, payload).unwrap();
    job
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn test_prints_filename_and_base64() {
    let dir = tempfile::tempdir().unwrap();
    let job = write_job(dir.path(), "");

    let out = cashflow_ods().arg(&job).output().unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let stdout = String::from_utf8(out.stdout.clone()).unwrap();
    let (name, encoded) = stdout.trim().split_once('|').unwrap();
    assert_eq!(name, "Cash_Flow_20250615_093000.ods");
    let bytes = base64::engine::general_purpose::STANDARD.decode(encoded).unwrap();
    assert_eq!(&bytes[..2], b"PK");

    // the ratio row cannot be cached and is reported
    assert!(stderr(&out).contains("warning:"), "stderr: {}", stderr(&out));
}

#[test]
fn test_output_directory_and_quiet() {
    let dir = tempfile::tempdir().unwrap();
    let job = write_job(dir.path(), r#", "locale": "fr-FR", "includeBankBalances": "true""#);
    let out_dir = dir.path().join("out");

    let out = cashflow_ods().arg(&job).arg("-o").arg(&out_dir).arg("-q").output().unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(out_dir.join("Cash_Flow_20250615_093000.ods").is_file());
    assert!(!stderr(&out).contains("warning:"));
}

#[test]
fn test_payload_from_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let job = write_job(dir.path(), "");
    let payload = std::fs::read_to_string(&job).unwrap();

    let mut child = cashflow_ods()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(payload.as_bytes()).unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("Cash_Flow_20250615_093000.ods|"));
}

#[test]
fn test_unsupported_data_source_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let job = dir.path().join("job.json");
    std::fs::write(&job, r#"{"sqlConnection": "postgres://db/cash"}"#).unwrap();

    let out = cashflow_ods().arg(&job).output().unwrap();
    assert_eq!(out.status.code(), Some(3));
    let err = stderr(&out);
    assert!(err.contains("error: unsupported data source"), "stderr: {err}");
    assert!(err.contains("hint:"));
}

#[test]
fn test_missing_connection_and_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let job = dir.path().join("job.json");
    std::fs::write(&job, r#"{"params": {}}"#).unwrap();
    assert_eq!(cashflow_ods().arg(&job).output().unwrap().status.code(), Some(3));

    let missing = dir.path().join("nope.json");
    assert_eq!(cashflow_ods().arg(&missing).output().unwrap().status.code(), Some(2));
}

#[test]
fn test_missing_database_is_a_repository_error() {
    let dir = tempfile::tempdir().unwrap();
    let job = dir.path().join("job.json");
    let db = dir.path().join("absent.db");
    std::fs::write(&job, format!(r#"{{"sqlConnection": {}}}"#, serde_json::to_string(db.to_str().unwrap()).unwrap()))
        .unwrap();
    assert_eq!(cashflow_ods().arg(&job).output().unwrap().status.code(), Some(5));
}
