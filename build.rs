//! Stamps `CIN7_FETCH_VERSION` into the crate for `--version` and the user agent.
//!
//! Resolution order: an explicit `CIN7_FETCH_VERSION` in the build
//! environment, then `git describe`, then the manifest version.

use std::{env, process::Command};

const VERSION_VAR: &str = "CIN7_FETCH_VERSION";

fn main() {
    println!("cargo:rerun-if-env-changed={}", VERSION_VAR);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let version = from_env()
        .or_else(from_git)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env={}={}", VERSION_VAR, version);
}

/// Packagers building from a tarball set the version explicitly.
fn from_env() -> Option<String> {
    env::var(VERSION_VAR)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn from_git() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;

    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();
    let version = described.strip_prefix('v').unwrap_or(described);

    (!version.is_empty()).then(|| version.to_string())
}
