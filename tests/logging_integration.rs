use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Runs an invocation with no prompt source so it fails right after logging startup.
fn run_with_logging_env(
    work_dir: &Path,
    log_output: &str,
    log_format: &str,
    log_file_path: Option<&Path>,
) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_promptdump"));
    cmd.current_dir(work_dir)
        .args(["--dump-to", "out.txt"])
        .env("RUST_LOG", "promptdump=info")
        .env("LOG_OUTPUT", log_output)
        .env("LOG_FORMAT", log_format)
        .env_remove("GOOGLE_API_KEY");

    if let Some(path) = log_file_path {
        cmd.env("LOG_FILE_PATH", path);
    } else {
        cmd.env_remove("LOG_FILE_PATH");
    }

    cmd.output().expect("failed to run promptdump binary")
}

fn find_rotated_log_file(dir: &Path, base_file_name: &str) -> PathBuf {
    let expected_prefix = format!("{base_file_name}.");
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)
        .expect("failed to read temp directory")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(&expected_prefix))
                .unwrap_or(false)
        })
        .collect();

    matches.sort();
    matches
        .pop()
        .expect("expected a rotated log file to be created")
}

#[test]
fn json_format_emits_json_log_lines_on_stderr() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_with_logging_env(dir.path(), "stderr", "json", None);
    assert!(
        !output.status.success(),
        "missing prompt source should fail command"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    let parsed: Vec<Value> = stderr
        .lines()
        .filter(|line| line.trim_start().starts_with('{'))
        .map(|line| serde_json::from_str::<Value>(line).expect("line should be valid JSON"))
        .collect();
    assert!(
        parsed.iter().any(|entry| {
            entry
                .get("fields")
                .and_then(|fields| fields.get("message"))
                .and_then(Value::as_str)
                == Some("loaded runtime configuration")
        }),
        "expected startup log message in JSON output, got stderr:\n{stderr}"
    );
}

#[test]
fn file_output_keeps_logs_off_stderr() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_dir = dir.path().join("logs");
    let log_path = log_dir.join("promptdump.log");
    let output = run_with_logging_env(dir.path(), "file", "pretty", Some(&log_path));
    assert!(!output.status.success());

    let rotated = find_rotated_log_file(&log_dir, "promptdump.log");
    let file_contents = fs::read_to_string(&rotated).expect("failed to read rotated log file");
    assert!(
        file_contents.contains("loaded runtime configuration"),
        "expected startup log message in file, got:\n{file_contents}"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        !stderr.contains("loaded runtime configuration"),
        "did not expect normal logs on stderr for file-only mode:\n{stderr}"
    );
    assert!(
        stderr.contains("no prompt source"),
        "expected command error output on stderr:\n{stderr}"
    );
}

#[test]
fn file_output_records_the_final_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_dir = dir.path().join("logs");
    let log_path = log_dir.join("promptdump.log");
    let output = run_with_logging_env(dir.path(), "file", "json", Some(&log_path));
    assert!(!output.status.success());

    let rotated = find_rotated_log_file(&log_dir, "promptdump.log");
    let file_contents = fs::read_to_string(&rotated).expect("failed to read rotated log file");
    let last: Value = file_contents
        .lines()
        .filter(|line| line.trim_start().starts_with('{'))
        .last()
        .map(|line| serde_json::from_str(line).expect("line should be valid JSON"))
        .expect("expected at least one JSON log line in file");

    assert_eq!(
        last.get("level").and_then(Value::as_str),
        Some("ERROR"),
        "unexpected last record: {last}"
    );
    assert_eq!(
        last.get("fields")
            .and_then(|fields| fields.get("message"))
            .and_then(Value::as_str),
        Some("promptdump failed"),
        "unexpected last record: {last}"
    );
}

#[test]
fn both_output_writes_logs_to_stderr_and_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_dir = dir.path().join("logs");
    let log_path = log_dir.join("promptdump.log");
    let output = run_with_logging_env(dir.path(), "both", "pretty", Some(&log_path));
    assert!(!output.status.success());

    let rotated = find_rotated_log_file(&log_dir, "promptdump.log");
    let file_contents = fs::read_to_string(&rotated).expect("failed to read rotated log file");
    assert!(
        file_contents.contains("loaded runtime configuration"),
        "expected startup log message in file, got:\n{file_contents}"
    );
    assert!(
        file_contents.contains("promptdump failed"),
        "expected failure record in file, got:\n{file_contents}"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("loaded runtime configuration"),
        "expected startup log message on stderr, got:\n{stderr}"
    );
}

#[test]
fn invalid_file_path_falls_back_to_stderr_logging() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocking_file = dir.path().join("not-a-directory");
    fs::write(&blocking_file, "block").expect("failed to create blocking file");
    let log_path = blocking_file.join("promptdump.log");

    let output = run_with_logging_env(dir.path(), "file", "pretty", Some(&log_path));
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to initialize LOG_OUTPUT=file"),
        "expected fallback warning, got:\n{stderr}"
    );
    assert!(
        stderr.contains("using stderr instead"),
        "expected stderr fallback message, got:\n{stderr}"
    );
    assert!(
        stderr.contains("loaded runtime configuration"),
        "expected logs to continue on stderr after fallback, got:\n{stderr}"
    );
}
