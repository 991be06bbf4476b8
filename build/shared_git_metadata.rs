use std::process::Command;

/// Stdout of a git command, or empty if git is unavailable or fails.
fn git(args: &[&str]) -> String {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default()
}

/// Export `GIT_COMMIT` and `RELEASE_VERSION` for `--version` banners.
///
/// `RELEASE_VERSION` is only set when HEAD carries a tag.
pub fn emit_git_metadata() {
    for path in ["build.rs", "../build/shared_git_metadata.rs", "../.git/HEAD", "../.git/refs", "../.git/packed-refs"] {
        println!("cargo:rerun-if-changed={path}");
    }

    println!("cargo:rustc-env=GIT_COMMIT={}", git(&["rev-parse", "HEAD"]));
    println!(
        "cargo:rustc-env=RELEASE_VERSION={}",
        git(&["describe", "--tags", "--exact-match", "HEAD"])
    );
}
