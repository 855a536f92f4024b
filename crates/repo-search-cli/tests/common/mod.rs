use std::path::Path;
use std::process::{Command, Output};

use url::Url;

/// File URL for a directory root.
pub fn file_url(path: &Path) -> String {
    Url::from_directory_path(path)
        .expect("Failed to convert path to file URL")
        .to_string()
}

/// Run the CLI binary with arguments.
pub fn run_cli(args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_repo-search"));
    cmd.args(args);
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("RUST_LOG");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub fn run_cli_success(args: &[&str]) -> String {
    let output = run_cli(args);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI and expect failure, returning stderr.
pub fn run_cli_failure(args: &[&str]) -> String {
    let output = run_cli(args);
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Create an account and return its DID.
pub fn create_account(pds: &str, handle: &str) -> String {
    let stdout = run_cli_success(&["repo", "--pds", pds, "create-account", handle]);
    stdout
        .split_whitespace()
        .find(|word| word.starts_with("did:plc:"))
        .expect("DID in create-account output")
        .to_string()
}

/// The `Next cursor` line printed on stderr, if any.
pub fn next_cursor(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .find_map(|line| line.strip_prefix("Next cursor: "))
        .map(|c| c.trim().to_string())
}
