//! Shared helpers for CLI integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Creates a temp AICHAT_HOME directory for test isolation.
pub fn temp_home() -> TempDir {
    TempDir::new().expect("create temp aichat home")
}

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// `aichat` with an isolated home and clean env, no base URL given.
pub fn aichat_unconfigured(home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("aichat");
    cmd.env("AICHAT_HOME", home.path())
        .env_remove("AICHAT_BASE_URL")
        .env_remove("AICHAT_LOG");
    cmd
}

/// `aichat` pointed at `base_url` with an isolated home and clean env.
pub fn aichat(home: &TempDir, base_url: &str) -> Command {
    let mut cmd = aichat_unconfigured(home);
    cmd.args(["--base-url", base_url]);
    cmd
}

/// Builds a streaming body of `data:` lines separated by blank lines.
pub fn data_lines(payloads: &[&str]) -> String {
    payloads
        .iter()
        .map(|payload| format!("data:{payload}\n\n"))
        .collect()
}
