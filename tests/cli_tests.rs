//! CLI integration tests

use std::process::Command;

fn screenreel_bin(config_home: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_screenreel"));
    // Keep the user's config file out of the way
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("SCREENREEL_OUTPUT_DIR")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_output() {
    let home = tempfile::tempdir().unwrap();
    let output = screenreel_bin(home.path())
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--duration"));
    assert!(stdout.contains("--format"));
    assert!(stdout.contains("--fps"));
    assert!(stdout.contains("--quality"));
    assert!(stdout.contains("--region"));
    assert!(stdout.contains("--external-encoder"));
    assert!(stdout.contains("monitors"));
}

#[test]
fn version_output() {
    let home = tempfile::tempdir().unwrap();
    let output = screenreel_bin(home.path())
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("screenreel"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_help() {
    let home = tempfile::tempdir().unwrap();
    let output = screenreel_bin(home.path())
        .args(["config", "--help"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("init"));
    assert!(stdout.contains("set"));
    assert!(stdout.contains("get"));
    assert!(stdout.contains("list"));
    assert!(stdout.contains("path"));
}

#[test]
fn config_set_get_list() {
    let home = tempfile::tempdir().unwrap();

    let set = screenreel_bin(home.path())
        .args(["config", "set", "container", "gif"])
        .output()
        .expect("Failed to execute command");
    assert!(set.status.success());
    assert!(home.path().join("screenreel").join("config.toml").exists());

    let get = screenreel_bin(home.path())
        .args(["config", "get", "container"])
        .output()
        .expect("Failed to execute command");
    assert!(get.status.success());
    assert_eq!(String::from_utf8_lossy(&get.stdout).trim(), "gif");

    let list = screenreel_bin(home.path())
        .args(["config", "list"])
        .output()
        .expect("Failed to execute command");
    let stdout = String::from_utf8_lossy(&list.stdout);
    assert!(stdout.contains("container"));
    assert!(stdout.contains("frame_rate"));
    assert!(stdout.contains("(not set)"));
}

#[test]
fn monitors_with_test_pattern() {
    let home = tempfile::tempdir().unwrap();
    let output = screenreel_bin(home.path())
        .args(["monitors", "--test-pattern"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("test-pattern"));
    assert!(stdout.contains("640x360+0+0"));
    assert!(stdout.starts_with('*'));
}

#[test]
fn records_test_pattern_into_image_sequence() {
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let output = screenreel_bin(home.path())
        .args(["--test-pattern", "-d", "1s", "-r", "5", "-f", "images", "--name", "demo", "-o"])
        .arg(out.path())
        .output()
        .expect("Failed to execute command");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let manifest = out.path().join("demo_frames").join("manifest.json");
    assert_eq!(stdout.trim(), manifest.display().to_string());
    assert!(manifest.exists());
    assert!(out.path().join("demo_frames").join("frame_000001.jpg").exists());
}

#[test]
fn output_dir_from_environment() {
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let output = screenreel_bin(home.path())
        .env("SCREENREEL_OUTPUT_DIR", out.path())
        .args(["--test-pattern", "-d", "1s", "-r", "4", "-f", "avi", "--name", "env"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let produced = out.path().join("env.avi");
    assert!(produced.exists());
    let bytes = std::fs::read(produced).unwrap();
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"AVI ");
}
