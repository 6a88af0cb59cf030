use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn sshmirror() -> Command {
    Command::cargo_bin("sshmirror").unwrap()
}

#[test]
fn help_lists_the_main_flags() {
    sshmirror()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--source"))
        .stdout(predicate::str::contains("--pull"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn missing_source_fails_with_a_clear_message() {
    sshmirror()
        .assert()
        .failure()
        .stderr(predicate::str::contains("source root is required"));
}

#[test]
fn nonexistent_settings_file_is_reported() {
    sshmirror()
        .args(["--config", "/no/such/settings.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read settings file"));
}

#[test]
fn unreachable_host_fails_after_the_retry_budget() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "source": {:?},
            "target": "/srv/data",
            "host": "127.0.0.1:1",
            "user": "nobody",
            "key": "/no/such/key",
            "maxRetries": 0,
            "retryBaseDelayMs": 1
        }}"#,
        dir.path()
    )
    .unwrap();

    sshmirror()
        .args(["--config"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to connect"));
}
