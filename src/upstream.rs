//! Upstream dataset build wrapper.
//!
//! The database generation logic belongs to the upstream MCPDict project;
//! this module only clones that repository, runs its build tool as an opaque
//! subprocess, and copies the resulting database into place. Any failure
//! along the way aborts with a non-zero exit so a partial artifact is never
//! packaged.

use anyhow::{anyhow, bail, Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::Config;

/// CLI entry point for `mcpdict build`.
///
/// Workflow:
/// 1. Clone the upstream repository into a cache directory, or fetch and
///    hard-reset when the checkout already exists.
/// 2. Run the configured build command inside the checkout.
/// 3. Verify the artifact was produced and copy it to `db.path`.
pub fn run_build(config: &Config) -> Result<()> {
    let upstream = &config.upstream;
    let checkout = checkout_dir(config);

    if checkout.join(".git").exists() {
        git_update(&checkout, &upstream.branch)?;
    } else {
        git_clone(&upstream.url, &upstream.branch, upstream.shallow, &checkout)?;
    }

    let head = git_head_sha(&checkout).unwrap_or_else(|_| "unknown".to_string());
    println!("Upstream {} at {}", upstream.url, head);

    run_build_command(&checkout, &upstream.build_command)?;

    let artifact = checkout.join(&upstream.artifact);
    if !artifact.exists() {
        bail!(
            "upstream build finished but did not produce '{}'",
            upstream.artifact
        );
    }

    if let Some(parent) = config.db.path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(&artifact, &config.db.path).with_context(|| {
        format!(
            "failed to copy {} to {}",
            artifact.display(),
            config.db.path.display()
        )
    })?;

    println!("Wrote {}", config.db.path.display());
    println!("Next: `mcpdict stamp` to version the database.");
    Ok(())
}

/// Where the upstream checkout lives: the configured directory, or a
/// URL-hashed path next to the database file.
fn checkout_dir(config: &Config) -> PathBuf {
    match &config.upstream.cache_dir {
        Some(dir) => dir.clone(),
        None => {
            let db_parent = config.db.path.parent().unwrap_or_else(|| Path::new("."));
            db_parent
                .join(".upstream-cache")
                .join(short_hash(&config.upstream.url))
        }
    }
}

fn git_clone(url: &str, branch: &str, shallow: bool, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)
        .with_context(|| format!("failed to create checkout directory: {}", dest.display()))?;

    let mut cmd = Command::new("git");
    cmd.args(["clone", "--branch", branch, "--single-branch"]);
    if shallow {
        cmd.args(["--depth", "1"]);
    }
    cmd.arg(url);
    cmd.arg(dest);

    let output = cmd
        .output()
        .with_context(|| "failed to execute 'git clone'. Is git installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git clone failed: {}", stderr.trim());
    }

    Ok(())
}

fn git_update(checkout: &Path, branch: &str) -> Result<()> {
    let output = Command::new("git")
        .args(["fetch", "origin", branch])
        .current_dir(checkout)
        .output()
        .with_context(|| "failed to execute 'git fetch'")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git fetch failed: {}", stderr.trim());
    }

    let remote_ref = format!("origin/{}", branch);
    let output = Command::new("git")
        .args(["reset", "--hard", &remote_ref])
        .current_dir(checkout)
        .output()
        .with_context(|| "failed to execute 'git reset'")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git reset failed: {}", stderr.trim());
    }

    Ok(())
}

fn git_head_sha(checkout: &Path) -> Result<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(checkout)
        .output()
        .with_context(|| "failed to get HEAD SHA")?;

    if !output.status.success() {
        bail!("git rev-parse HEAD failed");
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run the upstream project's own build tool inside the checkout.
///
/// Stdout and stderr are inherited (builds can take minutes); only the exit
/// status is checked.
fn run_build_command(checkout: &Path, command: &[String]) -> Result<()> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| anyhow!("upstream.build_command must not be empty"))?;

    println!("Running upstream build: {}", command.join(" "));

    let status = Command::new(program)
        .args(args)
        .current_dir(checkout)
        .status()
        .with_context(|| format!("failed to execute upstream build command '{}'", program))?;

    if !status.success() {
        bail!("upstream build command exited with {}", status);
    }

    Ok(())
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())[..12].to_string()
}
