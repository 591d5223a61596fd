use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;

const BIN: &str = env!("CARGO_BIN_EXE_harness-log");

const PASSING_LOG: &str = "\
09:59:58 harness boot
##########################################
# _f_login started 10:00:01              #
##########################################
10:00:01 login test start
executing login
10:00:03 login test end
------------------------------------------
login PASS 1.5 0
<_f_login>
Test_Start
_f_login 10:00:01
_f_ghost 10:04:00
Capture end
";

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../fixtures")
}

fn run(args: &[&str]) -> Output {
    Command::new(BIN).args(args).output().expect("failed to spawn harness-log")
}

fn write_log(dir: &tempfile::TempDir, name: &str, text: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, text).expect("failed to write log");
    path.to_string_lossy().into_owned()
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn fixture_suite_passes() {
    let dir = fixtures_dir();
    let output = run(&["test", dir.to_str().unwrap(), "--no-color"]);
    assert!(
        output.status.success(),
        "fixtures failed:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn no_arguments_prints_usage_payload() {
    let output = run(&[]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["error"], "Usage: harness-log <logfile>");
}

#[test]
fn bare_path_is_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(&dir, "run.log", PASSING_LOG);

    let output = run(&[&log, "--no-color"]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    let records = json.as_array().expect("array of records");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["testName"], "login");
    assert_eq!(records[1]["hasSubtests"], true);
    assert_eq!(records[2]["testItem"], "Summary");
    assert_eq!(records[2]["status"], "PASS");
}

#[test]
fn skipped_markers_are_reported_on_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(&dir, "run.log", PASSING_LOG);

    let output = run(&["parse", &log, "--no-color"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("<_f_ghost> tag not found"), "stderr: {}", stderr);
    stdout_json(&output);

    let quiet = run(&["parse", &log, "--quiet"]);
    assert!(quiet.stderr.is_empty());
}

#[test]
fn list_markers_prints_summary_entries() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(&dir, "run.log", PASSING_LOG);

    let output = run(&["parse", &log, "--list-markers"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "_f_login 10:00:01 11\n_f_ghost 10:04:00 12\n"
    );
}

#[test]
fn conventions_file_switches_dialect() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(
        &dir,
        "wifi.log",
        "************************\n* tc_wifi 15:00:00     *\n************************\n15:00:00 scan test start\n15:00:03 scan test end\n------------------------\nscan PASS 3.0 0\n<tc_wifi>\nRUN SUMMARY\ntc_wifi 15:00:00\nEND OF RUN\n",
    );
    let conventions = fixtures_dir().join("conventions/harness.toml");

    let output = run(&["parse", &log, "--conventions", conventions.to_str().unwrap()]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json[0]["testItem"], "tc_wifi");
    assert_eq!(json[0]["testName"], "scan");

    let default = run(&["parse", &log, "--no-color"]);
    assert_eq!(default.status.code(), Some(1));
}

#[test]
fn fatal_errors_exit_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(&dir, "broken.log", "nothing but noise\n");

    let output = run(&["parse", &log, "--no-color"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("could not locate summary block"), "stderr: {}", stderr);

    let missing = run(&["parse", "/nonexistent/harness.log"]);
    assert_eq!(missing.status.code(), Some(1));
}

#[test]
fn log_named_like_a_subcommand_needs_a_path_prefix() {
    let dir = tempfile::tempdir().unwrap();
    write_log(&dir, "test", PASSING_LOG);

    let output = Command::new(BIN)
        .args(["./test", "--quiet"])
        .current_dir(dir.path())
        .output()
        .expect("failed to spawn harness-log");
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)[2]["testItem"], "Summary");
}
