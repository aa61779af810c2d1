#![allow(deprecated)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const JOB: &str = "ci-knative-flakes-reporter";

fn flaketrack(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("flaketrack").unwrap();
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("FLAKETRACK_CONFIG")
        .env_remove("ARTIFACTS");
    cmd
}

/// Lay out build `id` of the reporter job, started now, as the latest build.
fn latest_build(root: &Path, id: u64) -> std::path::PathBuf {
    let job_dir = root.join("logs").join(JOB);
    let build_dir = job_dir.join(id.to_string());
    std::fs::create_dir_all(build_dir.join("artifacts")).unwrap();
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    std::fs::write(
        build_dir.join("started.json"),
        format!("{{\"timestamp\": {now}}}"),
    )
    .unwrap();
    std::fs::write(job_dir.join("latest-build.txt"), id.to_string()).unwrap();
    build_dir.join("artifacts")
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    flaketrack(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("executions"))
        .stdout(predicate::str::contains("ratios"));
}

#[test]
fn init_writes_defaults_once() {
    let dir = tempfile::tempdir().unwrap();
    flaketrack(dir.path()).arg("init").assert().success();

    let written = std::fs::read_to_string(dir.path().join("flaketrack.toml")).unwrap();
    assert!(written.contains("job_name = \"ci-knative-flakes-reporter\""));
    assert!(written.contains("retryer_bot_id = 48565599"));
    assert!(written.contains("cutover_date = \"2019-08-02\""));

    flaketrack(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    flaketrack(dir.path()).args(["init", "--force"]).assert().success();
}

#[test]
fn write_then_report() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = latest_build(dir.path(), 1002);

    flaketrack(dir.path())
        .args(["write", "--repo", "serving", "--test", "TestA,TestB", "--artifacts-dir"])
        .arg(&artifacts)
        .assert()
        .success();
    assert!(artifacts.join("serving/flaky-tests.json").exists());

    flaketrack(dir.path())
        .args(["report", "--repo", "serving", "--store-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout("serving: TestA\nserving: TestB\n");

    flaketrack(dir.path())
        .args(["report", "--format", "json", "--build", "1002", "--store-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"repo\": \"serving\""));
}

#[test]
fn write_dry_run_prints_json() {
    let dir = tempfile::tempdir().unwrap();
    flaketrack(dir.path())
        .args(["write", "--repo", "eventing", "--test", "TestC", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"TestC\""));
    assert!(!dir.path().join("artifacts").exists());
}

#[test]
fn missing_reports_exit_3() {
    let dir = tempfile::tempdir().unwrap();
    latest_build(dir.path(), 1002);
    flaketrack(dir.path())
        .args(["report", "--repo", "serving", "--store-root"])
        .arg(dir.path())
        .assert()
        .code(3)
        .stderr(predicate::str::contains("no JSON reports found"));
}

#[test]
fn invalid_config_exit_2() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("flaketrack.toml"),
        "[ratios]\ncutover_date = \"August\"\n",
    )
    .unwrap();
    flaketrack(dir.path())
        .args(["report", "--repo", "serving"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cutover_date"));
}

#[test]
fn explicit_missing_config_exit_2() {
    let dir = tempfile::tempdir().unwrap();
    flaketrack(dir.path())
        .args(["--config", "nope.toml", "report"])
        .assert()
        .code(2);
}

#[test]
fn bad_time_arguments_fail_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    flaketrack(dir.path())
        .args(["executions", "--range", "2019-07-01"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot parse time range"));
    flaketrack(dir.path())
        .args(["ratios", "--since", "last week"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("expected YYYY-MM-DD"));
}
