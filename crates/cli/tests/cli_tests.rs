use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `dqbot` isolated from the caller's environment and working directory.
fn dqbot(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dqbot").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("DQBOT_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("TEST_FOLDER_PATH")
        .env("DQBOT_TESTS_DIR", dir.path().join("generated"))
        .env("DQBOT_TARGET_DB", dir.path().join("crm.db"));
    cmd
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    dqbot(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Chat-driven SQL data quality tests"));
}

#[test]
fn test_cli_serve_help() {
    let dir = TempDir::new().unwrap();
    dqbot(&dir)
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("port").and(predicate::str::contains("schedule-secs")));
}

#[test]
fn test_validate_file() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.sql");
    fs::write(
        &good,
        "-- Test: emails\n\nSELECT id, CASE WHEN email IS NULL THEN 'FAIL' ELSE 'PASS' END AS test_result FROM customers;\n",
    )
    .unwrap();
    dqbot(&dir).arg("validate").arg(&good).assert().success().stdout(predicate::str::contains("OK"));
}

#[test]
fn test_validate_stdin_rejects_chatter() {
    let dir = TempDir::new().unwrap();
    dqbot(&dir)
        .arg("validate")
        .write_stdin("Sure, which table should I look at?")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid SQL"));
}

#[test]
fn test_validate_missing_file() {
    let dir = TempDir::new().unwrap();
    dqbot(&dir).args(["validate", "nope.sql"]).assert().failure().stderr(predicate::str::contains("nope.sql"));
}

#[test]
fn test_list_empty() {
    let dir = TempDir::new().unwrap();
    dqbot(&dir).arg("list").assert().success().stdout(predicate::str::contains("[]"));
}

#[test]
fn test_list_shows_stored_tests() {
    let dir = TempDir::new().unwrap();
    let tests = dir.path().join("generated");
    fs::create_dir_all(&tests).unwrap();
    fs::write(tests.join("row_count.sql"), "-- Test: Row count\n\nSELECT 'PASS' AS test_result").unwrap();
    dqbot(&dir).arg("list").assert().success().stdout(predicate::str::contains("Row count"));
}

#[test]
fn test_report_on_fresh_database() {
    let dir = TempDir::new().unwrap();
    dqbot(&dir).args(["report", "--ids", "a,b", "--desc"]).assert().success().stdout(predicate::str::contains("[]"));
}

#[test]
fn test_run_then_report() {
    let dir = TempDir::new().unwrap();
    let tests = dir.path().join("generated");
    fs::create_dir_all(&tests).unwrap();
    fs::write(tests.join("always.sql"), "-- Test: always\n\nSELECT 'PASS' AS test_result").unwrap();

    dqbot(&dir).arg("run").assert().success().stdout(predicate::str::contains("always: 1 PASS, 0 FAIL"));
    dqbot(&dir)
        .args(["report", "--ids", "always"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sql_query_id\": \"always\"").and(predicate::str::contains("\"pass_rate\": 1.0")));
}

#[test]
fn test_chat_requires_api_key() {
    let dir = TempDir::new().unwrap();
    dqbot(&dir)
        .arg("chat")
        .write_stdin("exit\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DQBOT_API_KEY"));
}
