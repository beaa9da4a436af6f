use std::process::Command;

/// Set by release pipelines that build from a source tarball without `.git`.
const HASH_OVERRIDE_VAR: &str = "TEAMCITY_MCP_GIT_HASH";

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn main() {
    let git_hash = std::env::var(HASH_OVERRIDE_VAR)
        .ok()
        .filter(|h| !h.is_empty())
        .or_else(|| {
            let hash = git(&["rev-parse", "--short", "HEAD"])?;
            let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
                .is_some_and(|s| !s.is_empty());
            Some(if dirty { format!("{}-dirty", hash) } else { hash })
        })
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);

    println!("cargo:rerun-if-env-changed={}", HASH_OVERRIDE_VAR);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");
}
