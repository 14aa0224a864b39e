//! Error scenario integration tests

use assert_cmd::Command;
use predicates::prelude::*;

fn screenreel_bin(config_home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("screenreel").expect("binary is built");
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("SCREENREEL_OUTPUT_DIR");
    cmd
}

#[test]
fn invalid_format_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();
    screenreel_bin(home.path())
        .args(["--format", "webm"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("webm"));
}

#[test]
fn invalid_duration_error() {
    let home = tempfile::tempdir().unwrap();
    screenreel_bin(home.path())
        .args(["--test-pattern", "--duration", "soon"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Invalid duration"));
}

#[test]
fn malformed_region_error() {
    let home = tempfile::tempdir().unwrap();
    screenreel_bin(home.path())
        .args(["--test-pattern", "--region", "1,2,3"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("1,2,3"));
}

#[test]
fn empty_region_is_rejected_before_recording() {
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    screenreel_bin(home.path())
        .args(["--test-pattern", "-d", "1s", "--region", "0,0,0,0", "-o"])
        .arg(out.path())
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty());
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn config_get_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    screenreel_bin(home.path())
        .args(["config", "get", "unknown_key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Valid keys"));
}

#[test]
fn config_set_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    screenreel_bin(home.path())
        .args(["config", "set", "api_key", "value"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown key"));
}

#[test]
fn config_set_invalid_values() {
    let home = tempfile::tempdir().unwrap();
    for (key, value) in [
        ("duration", "invalid"),
        ("frame_rate", "500"),
        ("quality", "lossless"),
        ("container", "mkv"),
        ("region", "0,0,0,0"),
    ] {
        screenreel_bin(home.path())
            .args(["config", "set", key, value])
            .assert()
            .failure()
            .stderr(predicate::str::contains(key));
    }
    assert!(!home.path().join("screenreel").join("config.toml").exists());
}

#[test]
fn config_set_invalid_boolean() {
    let home = tempfile::tempdir().unwrap();
    screenreel_bin(home.path())
        .args(["config", "set", "notify", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("true").or(predicate::str::contains("false")));
}

#[test]
fn config_init_twice_fails() {
    let home = tempfile::tempdir().unwrap();
    screenreel_bin(home.path())
        .args(["config", "init"])
        .assert()
        .success();
    screenreel_bin(home.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config.toml"));
}

#[test]
fn config_list_with_no_file() {
    let home = tempfile::tempdir().unwrap();
    screenreel_bin(home.path())
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("output_dir").and(predicate::str::contains("(not set)")));
}
