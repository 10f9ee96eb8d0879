// HttpSleuth - tests/cli.rs
//
// Drives the built binary: flags, exit codes and stdout/stderr split.

use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Run the binary with an isolated, empty config file.
fn httpsleuth(args: &[&str]) -> Output {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "").unwrap();
    Command::new(env!("CARGO_BIN_EXE_httpsleuth"))
        .args(args)
        .arg("--config")
        .arg(&config)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn cli_res_nok_emits_failed_transaction() {
    let path = fixture("android_async.log");
    let output = httpsleuth(&[path.to_str().unwrap(), "--res-nok"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "05-01 10:00:00.100: POST:503 https://api.example.com/login\n"
    );
}

#[test]
fn cli_res_ok_wins_over_res_nok() {
    let path = fixture("android_async.log");
    let output = httpsleuth(&[path.to_str().unwrap(), "--res-nok", "--res-ok"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(!out.contains(":503 "));
    assert!(out.contains("GET:200 https://api.example.com/retry"));
}

#[test]
fn cli_body_flags() {
    let path = fixture("ios_curl.log");
    let output = httpsleuth(&[path.to_str().unwrap(), "--req", "--resp"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "2024-05-01 10:00:00.123: POST:200 https://api.example.com/login\n\
         ->\n\
         {\"user\":\"bob\"}\n\
         <-\n\
         {\"token\":\"t-1\"}\n"
    );
}

#[test]
fn cli_filter_and_json() {
    let path = fixture("okhttp.log");
    let output = httpsleuth(&[path.to_str().unwrap(), "--json", "--filter", "*health*"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert_eq!(out.lines().count(), 1);
    let value: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
    assert_eq!(value["status"], 503);
    assert_eq!(value["url"], "https://api.example.com/health");
}

#[test]
fn cli_unknown_grammar_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.log");
    std::fs::write(&path, "nothing to see\n").unwrap();

    let output = httpsleuth(&[path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No suitable logs found in"), "stderr: {stderr}");
}

#[test]
fn cli_missing_file_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.log");
    let output = httpsleuth(&[path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn cli_invalid_pattern_exits_nonzero() {
    let path = fixture("ios_debug.log");
    let output = httpsleuth(&[path.to_str().unwrap(), "--filter", "[oops"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Error: Filter error: Invalid filter pattern '[oops'"),
        "stderr: {stderr}"
    );
}

#[test]
fn cli_fatal_error_keeps_earlier_records_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.log");
    std::fs::write(
        &path,
        "2024-05-01 10:00:00.000;Info: HTTP: GET https://api.example.com/a - 200 - 200 OK\n\
         broken info line Info: HTTP\n\
         next\n\
         2024-05-01 10:00:01.000;Info: HTTP: GET https://api.example.com/b - 200 - 200 OK\n\
         <-- END HTTP\n",
    )
    .unwrap();

    let output = httpsleuth(&[path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output),
        "2024-05-01 10:00:00.000: GET:200 https://api.example.com/a\n"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Parse error"), "stderr: {stderr}");
}
