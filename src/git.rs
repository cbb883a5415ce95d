//! Reads the local git checkout the tests are run for.

use std::{path::Path, process::Command};

use crate::{
    config::Repository,
    error::{Error, Result},
};

fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| Error::Git(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Git(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

/// Returns the branch checked out in `dir`.
///
/// # Errors
///
/// Returns [`Error::Git`] if git fails, or `HEAD` is detached.
pub fn current_branch(dir: &Path) -> Result<String> {
    let branch = git(dir, &["branch", "--show-current"])?;
    if branch.is_empty() {
        return Err(Error::Git(String::from("HEAD is detached, pass a branch")));
    }
    Ok(branch)
}

/// Returns the repository the `origin` remote of `dir` points to.
///
/// # Errors
///
/// Returns [`Error::Git`] if git fails, or [`Error::InvalidRepository`] if the remote url is not understood.
pub fn origin_repository(dir: &Path) -> Result<Repository> {
    Repository::from_remote_url(&git(dir, &["remote", "get-url", "origin"])?)
}
