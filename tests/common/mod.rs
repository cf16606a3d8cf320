/// Common test utilities and helpers for repo-puller tests
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const CSV_HEADER: &str = "user,name,local_destination,local_repo_dir_name,do_pull\n\
                              account,repository,parent directory,folder name,false to skip\n";

/// Scratch config, repository list and checkout directory for one binary run
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub src_dir: PathBuf,
    pub config_path: PathBuf,
    pub repos_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let src_dir = temp_dir.path().join("src");
        std::fs::create_dir_all(&src_dir).expect("Failed to create src dir");
        let config_path = temp_dir.path().join("config.yml");
        let repos_path = temp_dir.path().join("repos.csv");

        let env = Self {
            temp_dir,
            src_dir,
            config_path,
            repos_path,
        };
        env.write_config("");
        env
    }

    /// Write a config that points at the scratch directories, plus `extra` YAML
    pub fn write_config(&self, extra: &str) {
        let content = format!(
            "default_destination: \"{}\"\nrepos_file: \"{}\"\n{}",
            self.src_dir.display(),
            self.repos_path.display(),
            extra
        );
        std::fs::write(&self.config_path, content).expect("Failed to write test config");
    }

    /// Write the repository list with the standard header and `rows`
    pub fn write_repos(&self, rows: &str) {
        std::fs::write(&self.repos_path, format!("{}{}", CSV_HEADER, rows))
            .expect("Failed to write repository list");
    }

    /// Create `name` under the checkout directory
    pub fn create_checkout(&self, name: &str) -> PathBuf {
        let path = self.src_dir.join(name);
        std::fs::create_dir_all(&path).expect("Failed to create checkout");
        path
    }

    /// Install a fake git that logs its arguments and exits with `code`
    #[cfg(unix)]
    pub fn install_fake_git(&self, code: i32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let log = self.temp_dir.path().join("git-calls.log");
        let script = self.temp_dir.path().join("fake-git");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\necho \"$*\" >> '{}'\nexit {}\n",
                log.display(),
                code
            ),
        )
        .expect("Failed to write fake git");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake git executable");

        self.write_config(&format!("sync:\n  git_binary: \"{}\"\n", script.display()));
        log
    }

    /// Run the binary with `--config` pointing at this environment
    pub fn run(&self, args: &[&str]) -> Output {
        let mut full_args = vec!["--config", path_str(&self.config_path)];
        full_args.extend_from_slice(args);
        run_binary(&full_args, self.temp_dir.path())
    }
}

/// Run the binary with an isolated HOME and XDG config directory
pub fn run_binary(args: &[&str], home: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_repo-puller"))
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("GITHUB_TOKEN")
        .output()
        .expect("Failed to execute repo-puller")
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Assertion helpers for test validation
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}
