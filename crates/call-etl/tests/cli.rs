use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn run(resources: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_call-etl"))
        .arg("--resources-dir")
        .arg(resources)
        .args(extra)
        .env_remove("CALL_ETL_RESOURCES")
        .env_remove("RUST_LOG")
        .output()
        .expect("spawn call-etl")
}

fn seed(dir: &Path) {
    std::fs::write(
        dir.join("users.csv"),
        "firstName,lastName\nAlice,Smith\nBob,\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("callLogs.csv"),
        "phoneNumber,startTime,endTime,direction,userId\n555-1234,100,200,OUT,1\n555-5678,150,180,IN,1\n",
    )
    .unwrap();
}

#[test]
fn writes_reports_into_resources_dir() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());

    let output = run(dir.path(), &[]);

    assert!(output.status.success());
    let analytics = std::fs::read_to_string(dir.path().join("userAnalytics.csv")).unwrap();
    assert_eq!(analytics, "userId,avgDuration,numCalls\r\n1,65.0,2\r\n");
    let ordered = std::fs::read_to_string(dir.path().join("orderedCalls.csv")).unwrap();
    assert!(ordered.starts_with("callId,phoneNumber,startTime,endTime,direction,userId\r\n1,555-1234"));
}

#[test]
fn missing_users_file_prints_diagnostic_and_exits_cleanly() {
    let dir = TempDir::new().unwrap();

    let output = run(dir.path(), &[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Error: User CSV file not found:"));
    assert!(stdout.contains("users.csv"));
    assert!(!dir.path().join("userAnalytics.csv").exists());
    assert!(!dir.path().join("orderedCalls.csv").exists());
}

#[test]
fn strict_parse_failure_exits_with_error() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    std::fs::write(
        dir.path().join("callLogs.csv"),
        "phoneNumber,startTime,endTime,direction,userId\n555-1,soon,2,OUT,1\n",
    )
    .unwrap();

    let output = run(dir.path(), &["--strict"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid integer in startTime"));
    assert!(!dir.path().join("userAnalytics.csv").exists());
}

#[test]
fn json_flag_prints_summary() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());

    let output = run(dir.path(), &["--json", "--log-level", "ERROR"]);

    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["users"]["accepted"], 1);
    assert_eq!(summary["users"]["rejected"], 1);
    assert_eq!(summary["call_logs"]["accepted"], 2);
    assert_eq!(summary["ordered_calls_rows"], 2);
}
