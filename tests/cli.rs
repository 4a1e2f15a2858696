//! End-to-end tests for the binary surface.

use assert_cmd::Command;

fn ncli() -> Command {
    Command::cargo_bin("ncli").expect("binary builds")
}

#[test]
fn test_version_prints_package_version() {
    ncli()
        .arg("version")
        .assert()
        .success()
        .stdout(predicates::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_arguments_is_a_usage_error() {
    ncli().assert().failure().code(2);
}

#[test]
fn test_completions_bash_mentions_binary_name() {
    ncli()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicates::str::contains("ncli"));
}

#[test]
fn test_explicit_config_must_exist() {
    let dir = tempfile::tempdir().unwrap();

    ncli()
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .args(["audible", "export", "--target"])
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .code(2)
        .stderr(predicates::str::contains("Config file not found"));
}

#[test]
fn test_notion_export_rejects_unrecognized_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("not-an-export.zip");
    std::fs::write(&source, b"junk").unwrap();

    ncli()
        .args(["notion", "export", "--source"])
        .arg(&source)
        .arg("--target")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .code(5);
}
