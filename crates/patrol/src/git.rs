//! Changed-file discovery through git

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Files staged for commit
pub async fn staged_files(dir: &Path) -> Result<Vec<PathBuf>> {
    diff_names(dir, &["diff", "--cached", "--name-only", "--diff-filter=ACMR"]).await
}

/// Files changed against HEAD, staged or not
pub async fn changed_files(dir: &Path) -> Result<Vec<PathBuf>> {
    diff_names(dir, &["diff", "--name-only", "--diff-filter=ACMR", "HEAD"]).await
}

async fn repo_root(dir: &Path) -> Result<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(dir)
        .output()
        .await
        .context("Failed to run git rev-parse")?;

    if !output.status.success() {
        bail!("{} is not inside a git repository", dir.display());
    }

    Ok(PathBuf::from(String::from_utf8_lossy(&output.stdout).trim()))
}

async fn diff_names(dir: &Path, args: &[&str]) -> Result<Vec<PathBuf>> {
    let root = repo_root(dir).await?;
    let output = Command::new("git")
        .args(args)
        .current_dir(&root)
        .output()
        .await
        .context("Failed to run git diff")?;

    if !output.status.success() {
        bail!(
            "git diff failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(existing_paths(&root, &String::from_utf8_lossy(&output.stdout)))
}

/// Absolute paths for git's repo-relative names; deleted files are dropped
fn existing_paths(root: &Path, names: &str) -> Vec<PathBuf> {
    names
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| root.join(l))
        .filter(|p| p.is_file())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_existing_paths_skips_missing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "").unwrap();

        let paths = existing_paths(dir.path(), "a.js\ngone.py\n\n");
        assert_eq!(paths, vec![dir.path().join("a.js")]);
    }

    #[tokio::test]
    async fn test_staged_files_in_fresh_repo() {
        let dir = tempdir().unwrap();
        let git = |args: &[&str]| {
            std::process::Command::new("git")
                .args(args)
                .current_dir(dir.path())
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
        };
        if !git(&["init", "-q"]) {
            return;
        }
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("b.rb"), "").unwrap();
        assert!(git(&["add", "a.py"]));

        let staged = staged_files(dir.path()).await.unwrap();
        assert_eq!(staged.len(), 1);
        assert!(staged[0].is_absolute());
        assert_eq!(staged[0].file_name().unwrap(), "a.py");
    }
}
