// Embeds the git branch and short commit so the startup log identifies the build.
use std::process::Command;

/// Trimmed stdout of `git <args>`, or `unknown` outside a checkout.
fn git(args: &[&str]) -> String {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    for (key, args) in [
        ("GIT_BRANCH", &["rev-parse", "--abbrev-ref", "HEAD"][..]),
        ("GIT_COMMIT", &["rev-parse", "--short", "HEAD"][..]),
    ] {
        println!("cargo:rustc-env={}={}", key, git(args));
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");
    println!("cargo:rerun-if-changed=build.rs");
}
