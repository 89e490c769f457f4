use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn adminctl(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("adminctl").unwrap();
    cmd.env("ADMINCTL_CONFIG_DIR", config_dir.path())
        .env_remove("ADMINCTL_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_command_groups() {
    let dir = TempDir::new().unwrap();
    let assert = adminctl(&dir).arg("--help").assert().success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout).to_string();

    assert!(output.contains("Usage:"));
    for group in ["vault", "cloud", "vsphere", "credential", "util", "config"] {
        assert!(output.contains(group), "help is missing '{}'", group);
    }
    assert!(output.contains("-V, --version"));
}

#[test]
fn test_connection_help_shows_insecure_alias() {
    let dir = TempDir::new().unwrap();
    adminctl(&dir)
        .args(["vault", "account", "search", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--approve-all-certificates"))
        .stdout(predicate::str::contains("insecure"))
        .stdout(predicate::str::contains("--page-size"));
}

#[test]
fn test_missing_subcommand_is_usage_error() {
    let dir = TempDir::new().unwrap();
    adminctl(&dir).assert().failure().code(2);
    adminctl(&dir).arg("vault").assert().failure().code(2);
}

#[test]
fn test_base64_round_trip_through_cli() {
    let dir = TempDir::new().unwrap();
    adminctl(&dir)
        .args(["util", "base64", "encode", "admin:secret"])
        .assert()
        .success()
        .stdout("YWRtaW46c2VjcmV0\n");
    adminctl(&dir)
        .args(["util", "base64", "decode", "YWRtaW46c2VjcmV0"])
        .assert()
        .success()
        .stdout("admin:secret\n");
}

#[test]
fn test_invalid_base64_is_data_error() {
    let dir = TempDir::new().unwrap();
    adminctl(&dir)
        .args(["util", "base64", "decode", "not base64!"])
        .assert()
        .failure()
        .code(65);
}

#[test]
fn test_epoch_conversions() {
    let dir = TempDir::new().unwrap();
    adminctl(&dir)
        .args(["util", "time", "from-epoch", "0"])
        .assert()
        .success()
        .stdout("1970-01-01T00:00:00Z\n");
    adminctl(&dir)
        .args(["util", "time", "to-epoch", "2024-02-29T12:00:00+02:00"])
        .assert()
        .success()
        .stdout("1709200800\n");
}

#[test]
fn test_config_path_honors_environment() {
    let dir = TempDir::new().unwrap();
    adminctl(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            dir.path().to_string_lossy().to_string(),
        ));
}

#[test]
fn test_config_set_then_show() {
    let dir = TempDir::new().unwrap();
    adminctl(&dir)
        .args(["config", "set", "vault", "--server", "pvwa.lab", "--username", "ops"])
        .assert()
        .success();
    adminctl(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pvwa.lab"))
        .stdout(predicate::str::contains("ops"));
}

#[test]
fn test_unknown_namespace_is_rejected() {
    let dir = TempDir::new().unwrap();
    adminctl(&dir)
        .args(["config", "set", "mainframe", "--server", "x"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_logoff_requires_the_session_token() {
    let dir = TempDir::new().unwrap();
    for group in ["vault", "cloud", "vsphere"] {
        adminctl(&dir)
            .args([group, "logoff", "--server", "127.0.0.1:9"])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("--token"));
    }
}
