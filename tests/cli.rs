//! Command-line tests for the gitprofiles binary

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Env {
    _temp: TempDir,
    base: PathBuf,
    scratch: PathBuf,
}

impl Env {
    /// An initialized base directory with a fast KDF configured
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("git_profiles");
        let scratch = temp.path().join("scratch");
        fs::create_dir_all(&base).unwrap();
        fs::create_dir_all(&scratch).unwrap();
        fs::write(
            base.join("config.json"),
            r#"{"backup": {"kdf": {"n": 1024, "r": 8, "p": 1}}}"#,
        )
        .unwrap();

        let env = Self {
            _temp: temp,
            base,
            scratch,
        };
        env.cmd().arg("init").assert().success();
        env
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("gitprofiles").unwrap();
        cmd.arg("--base")
            .arg(&self.base)
            .env_remove("GITPROFILES_DIR")
            .env_remove("GITPROFILES_PASSWORD_FILE")
            .env_remove("RUST_LOG");
        cmd
    }

    fn password_file(&self, name: &str, password: &str) -> PathBuf {
        let path = self.scratch.join(name);
        fs::write(&path, format!("{}\n", password)).unwrap();
        path
    }

    fn create_backup(&self, output: &Path, password_file: &Path) {
        self.cmd()
            .args(["backup", "create", "--output"])
            .arg(output)
            .arg("--password-file")
            .arg(password_file)
            .assert()
            .success()
            .stdout(predicate::str::contains("Backed up"));
    }
}

#[test]
fn init_creates_layout() {
    let env = Env::new();

    for dir in ["keys", "meta", "backups", "gpg"] {
        assert!(env.base.join(dir).is_dir(), "{dir} missing");
    }
    assert_eq!(
        fs::read_to_string(env.base.join("meta/keys.json")).unwrap(),
        "{}"
    );
    // init keeps the existing settings
    assert!(fs::read_to_string(env.base.join("config.json"))
        .unwrap()
        .contains("1024"));
}

#[test]
fn backup_and_restore_round_trip() {
    let env = Env::new();
    fs::write(env.base.join("keys/a"), "secret").unwrap();
    let pw = env.password_file("pw", "password123");
    let container = env.base.join("backups/test.gpbk");
    let dest = env.scratch.join("restored");

    env.create_backup(&container, &pw);
    assert_eq!(&fs::read(&container).unwrap()[..4], b"GPBK");

    env.cmd()
        .args(["backup", "restore"])
        .arg(&container)
        .arg("--dest")
        .arg(&dest)
        .arg("--password-file")
        .arg(&pw)
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored"));

    assert_eq!(fs::read_to_string(dest.join("keys/a")).unwrap(), "secret");
    assert_eq!(fs::read_to_string(dest.join("meta/keys.json")).unwrap(), "{}");
    // The backups directory never ends up inside a backup
    assert!(!dest.join("backups").exists());
}

#[test]
fn wrong_password_fails_without_writing() {
    let env = Env::new();
    let container = env.base.join("backups/test.gpbk");
    let dest = env.scratch.join("restored");
    env.create_backup(&container, &env.password_file("pw", "password123"));

    env.cmd()
        .args(["backup", "restore"])
        .arg(&container)
        .arg("--dest")
        .arg(&dest)
        .arg("--password-file")
        .arg(env.password_file("bad", "not-the-password"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("wrong password or corrupted backup"));

    assert!(!dest.exists());
}

#[test]
fn password_file_from_environment() {
    let env = Env::new();
    let pw = env.password_file("pw", "password123");
    let container = env.scratch.join("env.gpbk");

    env.cmd()
        .args(["backup", "create", "--output"])
        .arg(&container)
        .env("GITPROFILES_PASSWORD_FILE", &pw)
        .assert()
        .success();

    assert!(container.exists());
}

#[test]
fn info_shows_header_without_password() {
    let env = Env::new();
    let container = env.base.join("backups/test.gpbk");
    env.create_backup(&container, &env.password_file("pw", "password123"));

    env.cmd()
        .args(["backup", "info"])
        .arg(&container)
        .assert()
        .success()
        .stdout(predicate::str::contains("Version:     1"))
        .stdout(predicate::str::contains("N=1024 r=8 p=1"));
}

#[test]
fn list_latest_and_history() {
    let env = Env::new();
    fs::write(env.base.join("keys/a"), "secret").unwrap();
    let pw = env.password_file("pw", "password123");

    env.cmd()
        .args(["backup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No backups found."));

    env.cmd()
        .args(["backup", "create", "--password-file"])
        .arg(&pw)
        .assert()
        .success();

    env.cmd()
        .args(["backup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("backup-"))
        .stdout(predicate::str::contains("Total: 1 backup(s)"));

    let dest = env.scratch.join("from-latest");
    env.cmd()
        .args(["backup", "restore", "latest", "--dest"])
        .arg(&dest)
        .arg("--password-file")
        .arg(&pw)
        .assert()
        .success();
    assert_eq!(fs::read_to_string(dest.join("keys/a")).unwrap(), "secret");

    env.cmd()
        .args(["backup", "history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BACKUP"))
        .stdout(predicate::str::contains("RESTORE"));
}

#[test]
fn restore_latest_without_backups_fails() {
    let env = Env::new();

    env.cmd()
        .args(["backup", "restore", "latest", "--dest"])
        .arg(env.scratch.join("x"))
        .arg("--password-file")
        .arg(env.password_file("pw", "password123"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no backups found"));
}

#[test]
fn invalid_kdf_settings_rejected() {
    let env = Env::new();
    fs::write(
        env.base.join("config.json"),
        r#"{"backup": {"kdf": {"n": 1000, "r": 8, "p": 1}}}"#,
    )
    .unwrap();
    let container = env.scratch.join("never.gpbk");

    env.cmd()
        .args(["backup", "create", "--output"])
        .arg(&container)
        .arg("--password-file")
        .arg(env.password_file("pw", "password123"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("power of two"));

    assert!(!container.exists());
}

#[test]
fn config_shows_paths_and_settings() {
    let env = Env::new();

    env.cmd()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("N=1024 r=8 p=1"))
        .stdout(predicate::str::contains("Initialized:      true"));
}
