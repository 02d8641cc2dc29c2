//! CLI tests for the `scpi run` subcommand.

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use assert_cmd::cargo;

fn scpi_cmd() -> Command {
    Command::new(cargo::cargo_bin!("scpi"))
}

fn write_temp_script(content: &str) -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.scpi");
    fs::write(&path, content).expect("write temp script");
    (dir, path.to_string_lossy().to_string())
}

fn run_with_stdin(args: &[&str], stdin_body: &str) -> std::process::Output {
    let mut child = scpi_cmd()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn scpi command");

    {
        let stdin = child.stdin.as_mut().expect("stdin handle");
        stdin
            .write_all(stdin_body.as_bytes())
            .expect("write stdin body");
    }

    child.wait_with_output().expect("wait for output")
}

#[test]
fn run_file_prints_responses() {
    let (_dir, path) = write_temp_script("*IDN?\nMEAS:VOLT:DC?\n");
    let output = scpi_cmd()
        .args(["run", &path])
        .output()
        .expect("run command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, "scpi-toolkit,demo-dmm,0,0.1.0\n12.500\n");
}

#[test]
fn run_supports_stdin_dash_path() {
    let output = run_with_stdin(&["run", "-"], "SYST:LED:BRIG 33\nSYST:LED:BRIG?\n");
    assert!(
        output.status.success(),
        "run stdin should succeed, stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout), "33\n");
}

#[test]
fn run_handles_unterminated_final_line() {
    let output = run_with_stdin(&["run", "-"], "*IDN?");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "scpi-toolkit,demo-dmm,0,0.1.0\n"
    );
}

#[test]
fn run_reports_errors_and_exits_nonzero() {
    let output = run_with_stdin(&["run", "-"], "BOGUS:CMD?\n*IDN?\n");
    assert_eq!(output.status.code(), Some(1));
    // The valid command still ran.
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("demo-dmm"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Undefined header"), "stderr={stderr}");
}

#[test]
fn run_json_envelope_carries_responses_and_errors() {
    let output = run_with_stdin(&["run", "-", "--json"], "*IDN?\nBOGUS\n");
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(json["ok"], false);
    assert_eq!(json["responses"][0], "scpi-toolkit,demo-dmm,0,0.1.0");
    assert_eq!(json["errors"][0]["number"], -113);
    assert_eq!(json["errors"][0]["message"], "Undefined header");
}

#[test]
fn run_missing_file_fails_with_context() {
    let output = scpi_cmd()
        .args(["run", "/no/such/file.scpi"])
        .output()
        .expect("run command");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("/no/such/file.scpi"), "stderr={stderr}");
}
