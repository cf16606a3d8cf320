mod common;

use common::{assert_contains_all, path_str, run_binary, stderr, stdout, TestEnvironment};
use tempfile::TempDir;

/// Integration tests for the repo-puller binary
/// These tests run the actual binary and verify its behavior

#[test]
fn test_cli_help() {
    let temp = TempDir::new().unwrap();
    let output = run_binary(&["--help"], temp.path());

    assert!(output.status.success());
    assert_contains_all(
        &stdout(&output),
        &[
            "--dry-run",
            "--verbose",
            "--seconds-between-pulls",
            "--clone",
            "--config",
        ],
    );
}

#[test]
fn test_cli_version() {
    let temp = TempDir::new().unwrap();
    let output = run_binary(&["--version"], temp.path());

    assert!(output.status.success());
    assert!(stdout(&output).contains("repo-puller"));
}

#[test]
fn test_invalid_flag() {
    let temp = TempDir::new().unwrap();
    let output = run_binary(&["--no-such-flag"], temp.path());

    assert!(!output.status.success());
    assert!(stderr(&output).contains("error"));
}

#[test]
fn test_dry_run_existing_checkout() {
    let env = TestEnvironment::new();
    env.write_repos("alice,proj,,,\n");
    env.create_checkout("proj");

    let output = env.run(&["--dry-run"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        format!("cd {}\ncd proj\ngit pull\n\n", env.src_dir.display())
    );
}

#[test]
fn test_dry_run_reports_skipped_rows() {
    let env = TestEnvironment::new();
    env.write_repos("alice,proj,,,false\nalice,other,,,\n");
    env.create_checkout("other");

    let output = env.run(&["--dry-run"]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.starts_with("skipping alice/proj\n"));
    assert!(out.contains("git pull"));
}

#[test]
fn test_missing_checkout_without_clone_warns() {
    let env = TestEnvironment::new();
    env.write_repos("alice,proj,,,\n");

    let output = env.run(&[]);

    let missing = env.src_dir.join("proj");
    assert!(output.status.success());
    assert_contains_all(
        &stdout(&output),
        &[&format!("couldn't find repository {}!", missing.display()), "--clone"],
    );
    assert!(!missing.exists());
}

#[test]
fn test_strict_exits_non_zero_on_missing_checkout() {
    let env = TestEnvironment::new();
    env.write_repos("alice,proj,,,\n");

    let output = env.run(&["--strict"]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_repos_file_flag_overrides_config() {
    let env = TestEnvironment::new();
    env.write_repos("alice,ignored,,,\n");
    env.create_checkout("chosen");

    let other_list = env.temp_dir.path().join("other.csv");
    std::fs::write(
        &other_list,
        format!("{}alice,chosen,,,\n", common::CSV_HEADER),
    )
    .unwrap();

    let output = env.run(&["--dry-run", "--repos-file", path_str(&other_list)]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("cd chosen"));
    assert!(!out.contains("ignored"));
}

#[test]
fn test_repository_list_defaults_next_to_config() {
    let env = TestEnvironment::new();
    std::fs::write(
        &env.config_path,
        format!("default_destination: \"{}\"\n", env.src_dir.display()),
    )
    .unwrap();
    env.write_repos("alice,proj,,,\n");
    env.create_checkout("proj");

    let output = env.run(&["--dry-run"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("cd proj"));
}

#[test]
fn test_verbose_prints_progress_and_summary() {
    let env = TestEnvironment::new();
    env.write_repos("alice,proj,,,\n");
    env.create_checkout("proj");

    let output = env.run(&["--dry-run", "--verbose"]);

    assert!(output.status.success());
    assert_contains_all(&stdout(&output), &["processing alice/proj", "1 repositories"]);
}

#[cfg(unix)]
#[test]
fn test_pull_failure_is_reported_but_exit_is_zero() {
    let env = TestEnvironment::new();
    let log = env.install_fake_git(1);
    env.write_repos("alice,proj,,,\n");
    let checkout = env.create_checkout("proj");

    let output = env.run(&[]);

    assert!(output.status.success());
    assert!(stdout(&output).contains(&format!("failure occurred on {}", checkout.display())));
    assert_eq!(std::fs::read_to_string(log).unwrap(), "pull\n");
}

#[cfg(unix)]
#[test]
fn test_dry_run_never_runs_git() {
    let env = TestEnvironment::new();
    let log = env.install_fake_git(0);
    env.write_repos("alice,proj,,,\n");
    env.create_checkout("proj");

    let output = env.run(&["--dry-run", "--clone"]);

    assert!(output.status.success());
    assert!(!log.exists());
}

#[test]
fn test_malformed_repository_list_is_fatal() {
    let env = TestEnvironment::new();
    env.write_repos("alice\n");

    let output = env.run(&[]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("repository list"));
}

#[test]
fn test_invalid_config_is_fatal() {
    let env = TestEnvironment::new();
    std::fs::write(&env.config_path, "github: [unclosed").unwrap();

    let output = env.run(&[]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("parse"));
}

#[test]
fn test_listing_without_username_is_fatal() {
    let env = TestEnvironment::new();
    env.write_config("github:\n  pull_my_repos: true\n");
    env.write_repos("alice,proj,,,\n");

    let output = env.run(&["--dry-run"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("github.username"));
    assert!(stdout(&output).is_empty());
}

#[cfg(target_os = "linux")]
#[test]
fn test_default_config_is_created() {
    let temp = TempDir::new().unwrap();

    let output = run_binary(&["--dry-run"], temp.path());

    // no repos.csv next to the fresh config yet
    assert!(!output.status.success());
    assert!(stderr(&output).contains("repos.csv"));
    assert!(temp
        .path()
        .join(".config")
        .join("repo-puller")
        .join("config.yml")
        .exists());
}
