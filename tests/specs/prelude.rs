//! Shared helpers for the behavioral specs

#![allow(dead_code)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;

/// Locate the `sbd` binary, building it once if the test run has not.
///
/// Cargo only sets `CARGO_BIN_EXE_*` for binaries of the package under
/// test, and `sbd` lives in `sb-daemon`, so look next to this test binary.
pub fn sbd_binary() -> &'static Path {
    static SBD: OnceLock<PathBuf> = OnceLock::new();
    SBD.get_or_init(|| {
        // Explicit override
        if let Ok(path) = std::env::var("SBD_BINARY") {
            return PathBuf::from(path);
        }

        // target/<profile>/deps/specs-<hash> -> target/<profile>/sbd
        let exe = std::env::current_exe().unwrap();
        let profile_dir = exe.parent().and_then(Path::parent).unwrap();
        let path = profile_dir.join(format!("sbd{}", std::env::consts::EXE_SUFFIX));
        if !path.exists() {
            let mut build = std::process::Command::new(env!("CARGO"));
            build.args(["build", "-p", "sb-daemon", "--bin", "sbd"]);
            if profile_dir.file_name().is_some_and(|name| name == "release") {
                build.arg("--release");
            }
            let status = build.status().unwrap();
            assert!(status.success(), "building sbd failed: {status}");
        }
        assert!(path.exists(), "sbd binary not found at {}", path.display());
        path
    })
}

/// A scratch directory to hold config and log files for one spec
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Project with `sbd.toml` holding `contents`
    pub fn with_config(contents: &str) -> Self {
        let project = Self::empty();
        project.file("sbd.toml", contents);
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("sbd.toml")
    }

    pub fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join(name)).unwrap_or_default()
    }

    /// `sbd` running inside the project directory
    pub fn sbd(&self) -> Sbd {
        let mut cmd = Command::new(sbd_binary());
        cmd.current_dir(self.path()).env_remove("RUST_LOG");
        Sbd { cmd }
    }
}

pub struct Sbd {
    cmd: Command,
}

impl Sbd {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn passes(mut self) -> Outcome {
        let output = self.cmd.timeout(std::time::Duration::from_secs(20)).output().unwrap();
        let outcome = Outcome::from(output);
        assert!(outcome.success, "expected success\n{}", outcome.describe());
        outcome
    }

    pub fn fails(mut self) -> Outcome {
        let output = self.cmd.timeout(std::time::Duration::from_secs(20)).output().unwrap();
        let outcome = Outcome::from(output);
        assert!(!outcome.success, "expected failure\n{}", outcome.describe());
        outcome
    }
}

pub struct Outcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl From<std::process::Output> for Outcome {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl Outcome {
    fn describe(&self) -> String {
        format!("--- stdout ---\n{}\n--- stderr ---\n{}", self.stdout, self.stderr)
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(
            predicate::str::contains(needle).eval(&self.stdout),
            "stdout missing {needle:?}\n{}",
            self.describe()
        );
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        assert!(
            !self.stdout.contains(needle),
            "stdout unexpectedly has {needle:?}\n{}",
            self.describe()
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(
            predicate::str::contains(needle).eval(&self.stderr),
            "stderr missing {needle:?}\n{}",
            self.describe()
        );
        self
    }

    /// Exact stdout, compared line by line
    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout.as_str(), expected);
        self
    }
}
