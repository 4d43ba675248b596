//! Integration tests for the migsync CLI.
//!
//! These tests run the binary against real git repositories holding a
//! minimal Django layout. On Unix a fake `.venv/bin/python` stands in for
//! the interpreter and records every `manage.py` invocation in `calls.log`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command as StdCommand;
use tempfile::TempDir;

/// Helper to run git in a directory.
fn git(args: &[&str], dir: &Path) {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Helper to write a file, creating parent directories.
fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, content).unwrap();
}

/// Helper to read the branch HEAD points at.
fn current_branch(dir: &Path) -> String {
    let output = StdCommand::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .current_dir(dir)
        .output()
        .expect("Failed to read HEAD");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Fake interpreter: logs its arguments (minus the manage.py path), answers
/// the `INSTALLED_APPS` probe and fakes `makemigrations` (printing to stdout
/// like Django does). `migrate` fails
/// when a `fail_migrate` file exists in the project root.
#[cfg(unix)]
const FAKE_PYTHON: &str = r#"#!/bin/sh
shift
echo "$*" >> calls.log
case "$1" in
  shell) echo '["django.contrib.auth", "billing.apps.BillingConfig", "shop"]' ;;
  migrate) if [ -f fail_migrate ]; then exit 1; fi ;;
  makemigrations)
    echo "Migrations for '$2':"
    touch "$2/migrations/0003_regenerated.py" ;;
esac
exit 0
"#;

/// Helper to create a Django project in a git repository.
///
/// `dev` holds billing 0001-0002 and shop 0001; `feature` (checked out)
/// adds `billing/migrations/0003_y.py`.
fn setup_django_repo() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let root = temp.path();

    git(&["init"], root);
    git(&["config", "user.email", "test@example.com"], root);
    git(&["config", "user.name", "Test User"], root);

    write(root, ".gitignore", ".venv/\ncalls.log\nfail_migrate\n");
    write(root, "manage.py", "");
    write(root, "billing/__init__.py", "");
    write(root, "billing/migrations/__init__.py", "");
    write(root, "billing/migrations/0001_initial.py", "");
    write(root, "billing/migrations/0002_x.py", "");
    write(root, "shop/migrations/__init__.py", "");
    write(root, "shop/migrations/0001_initial.py", "");

    git(&["add", "."], root);
    git(&["commit", "-m", "Initial project"], root);
    git(&["branch", "-M", "dev"], root);

    git(&["checkout", "-b", "feature"], root);
    write(root, "billing/migrations/0003_y.py", "");
    git(&["add", "."], root);
    git(&["commit", "-m", "Add billing migration"], root);

    install_fake_python(root);
    temp
}

#[cfg(unix)]
fn install_fake_python(root: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let python = root.join(".venv/bin/python");
    write(root, ".venv/bin/python", FAKE_PYTHON);
    fs::set_permissions(&python, fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(not(unix))]
fn install_fake_python(_root: &Path) {}

/// Helper to read the recorded manage.py invocations.
fn calls(root: &Path) -> String {
    fs::read_to_string(root.join("calls.log")).unwrap_or_default()
}

/// Helper to get migsync command with a clean environment.
fn migsync() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_migsync"));
    cmd.env_remove("DEV_BRANCH")
        .env_remove("VIRTUAL_ENV")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

// ============================================================================
// Basic CLI tests
// ============================================================================

#[test]
fn test_version_flag() {
    migsync()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("migsync"));
}

#[test]
fn test_help_flag() {
    migsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--resequence"))
        .stdout(predicate::str::contains("--skip-checkout"))
        .stdout(predicate::str::contains("--apply"));
}

#[test]
fn test_apply_without_resequence_is_rejected() {
    migsync()
        .arg("--apply")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--resequence"));
}

#[test]
fn test_outside_django_project() {
    let temp = TempDir::new().expect("Failed to create temp dir");

    migsync()
        .current_dir(&temp)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("manage.py"));
}

#[test]
fn test_explicit_project_root_without_manage_py() {
    let temp = TempDir::new().expect("Failed to create temp dir");

    migsync()
        .arg("--project-root")
        .arg(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("manage.py"));
}

#[test]
fn test_project_not_in_git_repo() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    write(temp.path(), "manage.py", "");

    migsync()
        .current_dir(&temp)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("git repository"));
}

// ============================================================================
// Reference branch resolution tests
// ============================================================================

#[test]
#[cfg(unix)]
fn test_nonexistent_branch() {
    let temp = setup_django_repo();

    migsync()
        .args(["--branch", "nonexistent"])
        .current_dir(&temp)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("branch 'nonexistent' does not exist"));

    assert!(temp.path().join("billing/migrations/0003_y.py").exists());
    assert!(!calls(temp.path()).contains("migrate"));
}

#[test]
#[cfg(unix)]
fn test_dev_branch_env_sets_default() {
    let temp = setup_django_repo();

    migsync()
        .env("DEV_BRANCH", "release")
        .current_dir(&temp)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("branch 'release' does not exist"));
}

#[test]
#[cfg(unix)]
fn test_config_file_sets_default_branch() {
    let temp = setup_django_repo();
    write(temp.path(), "migsync.toml", "[general]\ndefault_branch = \"develop\"\n");

    migsync()
        .arg("--dry-run")
        .current_dir(&temp)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("branch 'develop' does not exist"));

    // The flag wins over the file
    migsync()
        .args(["--dry-run", "--branch", "dev"])
        .current_dir(&temp)
        .assert()
        .success();
}

#[test]
#[cfg(unix)]
fn test_remote_ref_spelled_out_is_rejected_before_changes() {
    let temp = setup_django_repo();
    git(&["update-ref", "refs/remotes/origin/dev", "dev"], temp.path());

    migsync()
        .args(["--branch", "origin/dev"])
        .current_dir(&temp)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'origin/dev' is not a branch"));

    assert!(temp.path().join("billing/migrations/0003_y.py").exists());
    assert!(!calls(temp.path()).contains("migrate"));
    assert_eq!(current_branch(temp.path()), "feature");

    // Dry-run still shows the plan, with a warning
    migsync()
        .args(["--branch", "origin/dev", "--dry-run"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("would checkout origin/dev"))
        .stderr(predicate::str::contains("'origin/dev' is not a branch"));

    // Comparing against a revision is fine when nothing is checked out
    migsync()
        .args(["--branch", "origin/dev", "--skip-checkout"])
        .current_dir(&temp)
        .assert()
        .success();
    assert!(!temp.path().join("billing/migrations/0003_y.py").exists());
}

#[test]
#[cfg(unix)]
fn test_tag_reference_is_rejected_before_changes() {
    let temp = setup_django_repo();
    git(&["tag", "v1.0", "dev"], temp.path());

    migsync()
        .args(["--branch", "v1.0"])
        .current_dir(&temp)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'v1.0' is not a branch"));

    assert!(temp.path().join("billing/migrations/0003_y.py").exists());
    assert!(!calls(temp.path()).contains("migrate"));
}

// ============================================================================
// Project root tests
// ============================================================================

#[test]
#[cfg(unix)]
fn test_relative_project_root() {
    let temp = setup_django_repo();

    migsync()
        .args(["--project-root", "..", "--skip-checkout"])
        .current_dir(temp.path().join("billing"))
        .assert()
        .success()
        .stderr(predicate::str::contains("INSTALLED_APPS").not());

    assert!(!temp.path().join("billing/migrations/0003_y.py").exists());
    let log = calls(temp.path());
    assert!(log.contains("shell"));
    assert!(log.contains("migrate --noinput"));
}

// ============================================================================
// Reset mode tests
// ============================================================================

#[test]
#[cfg(unix)]
fn test_reset_dry_run_prints_plan() {
    let temp = setup_django_repo();

    migsync()
        .arg("--dry-run")
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("would delete billing/migrations/0003_y.py"))
        .stdout(predicate::str::contains("would run migrate"))
        .stdout(predicate::str::contains("would checkout dev"));

    assert!(temp.path().join("billing/migrations/0003_y.py").exists());
    assert_eq!(current_branch(temp.path()), "feature");
    assert!(!calls(temp.path()).contains("migrate"));
}

#[test]
#[cfg(unix)]
fn test_reset_dry_run_json() {
    let temp = setup_django_repo();

    let output = migsync()
        .args(["--dry-run", "--json"])
        .current_dir(&temp)
        .output()
        .expect("Failed to run migsync");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["outcome"], "dry_run");
    assert_eq!(value["plan"][0]["action"], "delete_file");
    assert_eq!(value["plan"][0]["path"], "billing/migrations/0003_y.py");
    assert_eq!(value["plan"][1]["action"], "migrate");
    assert_eq!(value["plan"][2]["branch"], "dev");
}

#[test]
#[cfg(unix)]
fn test_reset_deletes_migrates_and_checks_out() {
    let temp = setup_django_repo();

    migsync()
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("billing: 1 local-only migration"));

    assert!(!temp.path().join("billing/migrations/0003_y.py").exists());
    assert!(temp.path().join("billing/migrations/0002_x.py").exists());
    assert!(calls(temp.path()).contains("migrate --noinput"));
    assert_eq!(current_branch(temp.path()), "dev");

    // A second run has nothing left to do
    migsync()
        .arg("--force")
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("already match"));
}

#[test]
#[cfg(unix)]
fn test_reset_skip_checkout() {
    let temp = setup_django_repo();

    migsync()
        .arg("--skip-checkout")
        .current_dir(&temp)
        .assert()
        .success();

    assert!(!temp.path().join("billing/migrations/0003_y.py").exists());
    assert_eq!(current_branch(temp.path()), "feature");
}

#[test]
#[cfg(unix)]
fn test_reset_unapply_rolls_back_first() {
    let temp = setup_django_repo();

    migsync()
        .args(["--unapply", "--skip-checkout"])
        .current_dir(&temp)
        .assert()
        .success();

    let log = calls(temp.path());
    let rollback = log.find("migrate billing 0002_x --noinput").expect("rollback not run");
    let migrate = log.rfind("migrate --noinput").expect("migrate not run");
    assert!(rollback < migrate);
}

#[test]
#[cfg(unix)]
fn test_reset_already_on_reference_branch() {
    let temp = setup_django_repo();
    git(&["checkout", "dev"], temp.path());
    write(temp.path(), "billing/migrations/0003_stray.py", "");

    migsync()
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Already on 'dev'"));
    assert!(temp.path().join("billing/migrations/0003_stray.py").exists());

    migsync()
        .arg("--force")
        .current_dir(&temp)
        .assert()
        .success();
    assert!(!temp.path().join("billing/migrations/0003_stray.py").exists());
}

#[test]
#[cfg(unix)]
fn test_reset_migrate_failure_reports_completed_steps() {
    let temp = setup_django_repo();
    write(temp.path(), "fail_migrate", "");

    migsync()
        .current_dir(&temp)
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "run migrate failed: migrate failed (exit code 1)",
        ))
        .stderr(predicate::str::contains("migrate failed (exit code 1): ").not())
        .stderr(predicate::str::contains("step failed").not())
        .stderr(predicate::str::contains("delete billing/migrations/0003_y.py"));

    assert!(!temp.path().join("billing/migrations/0003_y.py").exists());
    assert_eq!(current_branch(temp.path()), "feature");
}

#[test]
#[cfg(unix)]
fn test_reset_app_filter() {
    let temp = setup_django_repo();

    migsync()
        .args(["--app", "shop", "--skip-checkout"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("already match"));

    assert!(temp.path().join("billing/migrations/0003_y.py").exists());
}

// ============================================================================
// Resequence mode tests
// ============================================================================

#[test]
#[cfg(unix)]
fn test_resequence_report() {
    let temp = setup_django_repo();

    migsync()
        .arg("--resequence")
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "billing: 1 feature-only migration (0003_y.py), reference max = 0002",
        ))
        .stdout(predicate::str::contains("--apply"));

    assert!(temp.path().join("billing/migrations/0003_y.py").exists());
    assert!(!calls(temp.path()).contains("makemigrations"));
}

#[test]
#[cfg(unix)]
fn test_resequence_nothing_to_do() {
    let temp = setup_django_repo();
    git(&["checkout", "dev"], temp.path());

    migsync()
        .args(["-r", "--apply"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to resequence"));
}

#[test]
#[cfg(unix)]
fn test_resequence_apply_declined() {
    let temp = setup_django_repo();

    migsync()
        .args(["-r", "--apply"])
        .write_stdin("n\n")
        .current_dir(&temp)
        .assert()
        .code(3)
        .stderr(predicate::str::contains(
            "Delete these migrations and run makemigrations? [y/N]",
        ))
        .stdout(predicate::str::contains("Aborted."));

    assert!(temp.path().join("billing/migrations/0003_y.py").exists());
    assert!(!calls(temp.path()).contains("makemigrations"));
}

#[test]
#[cfg(unix)]
fn test_resequence_apply_eof_declines() {
    let temp = setup_django_repo();

    migsync()
        .args(["-r", "--apply"])
        .write_stdin("")
        .current_dir(&temp)
        .assert()
        .code(3);

    assert!(temp.path().join("billing/migrations/0003_y.py").exists());
}

#[test]
#[cfg(unix)]
fn test_resequence_apply_confirmed() {
    let temp = setup_django_repo();

    migsync()
        .args(["-r", "--apply"])
        .write_stdin("yes\n")
        .current_dir(&temp)
        .assert()
        .success();

    assert!(!temp.path().join("billing/migrations/0003_y.py").exists());
    assert!(temp.path().join("billing/migrations/0003_regenerated.py").exists());
    assert!(calls(temp.path()).contains("makemigrations billing"));
    assert_eq!(current_branch(temp.path()), "feature");
}

#[test]
#[cfg(unix)]
fn test_resequence_apply_with_yes_skips_prompt() {
    let temp = setup_django_repo();

    migsync()
        .args(["-r", "--apply", "--yes"])
        .current_dir(&temp)
        .assert()
        .success()
        .stderr(predicate::str::contains("[y/N]").not());

    assert!(!temp.path().join("billing/migrations/0003_y.py").exists());
    assert!(temp.path().join("billing/migrations/0003_regenerated.py").exists());
    assert!(temp.path().join("shop/migrations/0001_initial.py").exists());
}

#[test]
#[cfg(unix)]
fn test_resequence_apply_dry_run() {
    let temp = setup_django_repo();

    migsync()
        .args(["-r", "--apply", "--dry-run"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("would delete billing/migrations/0003_y.py"))
        .stdout(predicate::str::contains("would run makemigrations billing"));

    assert!(temp.path().join("billing/migrations/0003_y.py").exists());
    assert!(!calls(temp.path()).contains("makemigrations"));
}

#[test]
#[cfg(unix)]
fn test_resequence_refuses_when_behind_reference() {
    let temp = setup_django_repo();
    git(&["checkout", "dev"], temp.path());
    write(temp.path(), "billing/migrations/0003_z.py", "");
    git(&["add", "."], temp.path());
    git(&["commit", "-m", "Add upstream migration"], temp.path());
    git(&["checkout", "feature"], temp.path());

    migsync()
        .args(["-r", "--apply", "--yes"])
        .current_dir(&temp)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("0003_z.py"));

    assert!(temp.path().join("billing/migrations/0003_y.py").exists());
}

#[test]
#[cfg(unix)]
fn test_resequence_apply_json_declined() {
    let temp = setup_django_repo();

    let output = migsync()
        .args(["-r", "--apply", "--json"])
        .write_stdin("n\n")
        .current_dir(&temp)
        .output()
        .expect("Failed to run migsync");
    assert_eq!(output.status.code(), Some(3));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["state"], "aborted");
    assert_eq!(value["apps"][0]["app"], "billing");
    assert!(String::from_utf8_lossy(&output.stderr).contains("[y/N]"));
    assert!(temp.path().join("billing/migrations/0003_y.py").exists());
}

#[test]
#[cfg(unix)]
fn test_resequence_apply_json_confirmed() {
    let temp = setup_django_repo();

    let output = migsync()
        .args(["-r", "--apply", "--json"])
        .write_stdin("y\n")
        .current_dir(&temp)
        .output()
        .expect("Failed to run migsync");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["state"], "done");
    assert_eq!(value["completed"][0]["action"], "delete_file");
    assert_eq!(value["completed"][1]["action"], "make_migrations");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Migrations for 'billing':"));
}
