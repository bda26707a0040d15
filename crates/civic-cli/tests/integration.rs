#![allow(deprecated)]
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn civic_migrate(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("civic-migrate").unwrap();
    cmd.current_dir(dir.path())
        .env("CIVIC_MIGRATE_ROOT", dir.path())
        .env("NO_COLOR", "1");
    cmd
}

fn subtheme(dir: &TempDir) -> PathBuf {
    let theme = dir.path().join("mytheme");
    std::fs::create_dir_all(theme.join("components")).unwrap();
    std::fs::write(
        theme.join("mytheme.info.yml"),
        "name: My theme\ntype: theme\nbase theme: civictheme\n",
    )
    .unwrap();
    theme
}

fn configure(dir: &TempDir, theme: &Path) {
    std::fs::write(
        dir.path().join(".env"),
        format!(
            "SUBTHEME_DIR='{}'\nANTHROPIC_API_KEY='sk-ant-test-key-0000'\nANTHROPIC_MODEL='claude-test'\n",
            theme.display()
        ),
    )
    .unwrap();
}

fn session_logs(dir: &TempDir) -> Vec<PathBuf> {
    std::fs::read_dir(dir.path().join("logs"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

#[test]
fn version_flag_works() {
    let dir = TempDir::new().unwrap();
    civic_migrate(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("civic-migrate"));
}

#[test]
fn exit_choice_ends_the_session() {
    let dir = TempDir::new().unwrap();
    civic_migrate(&dir)
        .write_stdin("4\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("2. Configure"))
        .stdout(predicate::str::contains("not configured yet"));

    let logs = session_logs(&dir);
    assert_eq!(logs.len(), 1);
    let log = std::fs::read_to_string(&logs[0]).unwrap();
    assert!(log.contains("Session closed"));
}

#[test]
fn end_of_input_is_a_graceful_exit() {
    let dir = TempDir::new().unwrap();
    civic_migrate(&dir).write_stdin("").assert().success();
}

#[test]
fn log_directory_failure_exits_with_status_1() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("logs"), "not a directory").unwrap();
    civic_migrate(&dir)
        .write_stdin("4\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error: cannot start session log"));
}

// ---------------------------------------------------------------------------
// Menu actions
// ---------------------------------------------------------------------------

#[test]
fn configure_writes_the_settings_file() {
    let dir = TempDir::new().unwrap();
    let theme = subtheme(&dir);
    civic_migrate(&dir)
        .write_stdin(format!("2\n{}\nsk-ant-api03-integration\n\n4\n", theme.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration saved"))
        .stdout(predicate::str::contains("1. Run migration"));

    let env = std::fs::read_to_string(dir.path().join(".env")).unwrap();
    assert!(env.contains("SUBTHEME_DIR="));
    assert!(env.contains("ANTHROPIC_API_KEY='sk-ant-api03-integration'"));
    assert!(env.contains("ANTHROPIC_MODEL="));
}

#[test]
fn show_configuration_masks_the_key() {
    let dir = TempDir::new().unwrap();
    let theme = subtheme(&dir);
    configure(&dir, &theme);
    civic_migrate(&dir)
        .write_stdin("3\n4\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("sk-ant-…0000"))
        .stdout(predicate::str::contains("sk-ant-test-key-0000").not());
}

#[test]
fn failed_migration_returns_to_the_menu() {
    let dir = TempDir::new().unwrap();
    let theme = subtheme(&dir);
    configure(&dir, &theme);
    let scripts = dir.path().join("scripts");
    std::fs::create_dir_all(&scripts).unwrap();
    std::fs::write(
        scripts.join("update-storybook.sh"),
        "echo 'storybook bump failed' >&2\nexit 3\n",
    )
    .unwrap();

    civic_migrate(&dir)
        .write_stdin("1\ny\n4\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("exited with code 3"))
        .stdout(predicate::str::contains("Returning to the menu"));

    let logs = session_logs(&dir);
    let log = std::fs::read_to_string(&logs[0]).unwrap();
    assert!(log.contains("[ERROR]"));
    assert!(log.contains("storybook bump failed"));
}
