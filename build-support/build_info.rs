//! Build identification shared by every NeuroPulse binary
//!
//! Each crate's `build.rs` pulls this file in with `#[path]` and calls
//! [`emit`]. The values surface at runtime through `np_common::build_info!`
//! and the `/api/buildinfo` endpoint.

use std::process::Command;

/// Placeholder reported when a value cannot be determined
pub const UNKNOWN: &str = "unknown";

/// Emit `GIT_HASH`, `BUILD_TIMESTAMP` and `BUILD_PROFILE` for the crate being built
#[allow(dead_code)]
pub fn emit() {
    let commit = describe_commit(git_output(&["rev-parse", "--short=8", "HEAD"]), worktree_dirty());
    let profile = std::env::var("PROFILE").ok();

    println!("cargo:rustc-env=GIT_HASH={}", commit);
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", build_timestamp());
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile_name(profile.as_deref()));

    // Timestamp and hash must refresh on every build, so no rerun-if-changed
}

/// Short hash with a `-dirty` suffix when the worktree has uncommitted changes
pub fn describe_commit(hash: Option<String>, dirty: bool) -> String {
    match hash.map(|h| h.trim().to_string()).filter(|h| !h.is_empty()) {
        Some(hash) if dirty => format!("{}-dirty", hash),
        Some(hash) => hash,
        None => UNKNOWN.to_string(),
    }
}

/// Cargo sets `PROFILE` to "debug" or "release" for build scripts
pub fn profile_name(profile: Option<&str>) -> String {
    match profile.map(str::trim) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// ISO 8601 with local offset, e.g. 2025-10-26T14:30:45-05:00
pub fn build_timestamp() -> String {
    chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false)
}

fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

fn worktree_dirty() -> bool {
    git_output(&["status", "--porcelain", "--untracked-files=no"])
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false)
}
