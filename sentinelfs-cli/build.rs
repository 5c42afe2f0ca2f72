// Build script to inject version information from git tags
//
// Uses git describe at build time and falls back to CARGO_PKG_VERSION when
// git is unavailable, so release builds show the tag and dev builds show the
// commit they were cut from.

use std::process::Command;

fn main() {
    let version = get_git_version().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=SENTINELFS_VERSION={}", version);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");
    println!("cargo:rerun-if-changed=.git/refs/tags");
}

fn get_git_version() -> Option<String> {
    // git describe yields "v0.1.0", "v0.1.0-5-gabc123", or "abc123-dirty"
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let version = String::from_utf8(output.stdout).ok()?;
    let version = version.trim();

    if let Some(tagged) = version.strip_prefix('v') {
        // Keep only the version part of tag-with-commits forms
        match tagged.find('-') {
            Some(dash_pos) => Some(tagged[..dash_pos].to_string()),
            None => Some(tagged.to_string()),
        }
    } else {
        // Untagged checkout: pair the crate version with the commit id
        let base_version = env!("CARGO_PKG_VERSION");
        Some(format!("{}-{}", base_version, version))
    }
}
