//! Local git repositories for `git_clone` tests.
//!
//! `git ls-remote` accepts a plain directory path as the remote, so a
//! repository created here stands in for a hosted one.

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::process::Command;

/// A git repository in a test directory.
pub struct TestGit {
    repo_path: PathBuf,
}

impl TestGit {
    fn run(&self, args: &[&str], action: &str) -> Result<std::process::Output> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()
            .with_context(|| action.to_string())?;

        if !output.status.success() {
            bail!("{} failed: {}", action, String::from_utf8_lossy(&output.stderr));
        }

        Ok(output)
    }

    /// Wrap an existing directory.
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    /// Create a repository with one commit on `branch` and return it.
    pub fn with_branch(repo_path: impl Into<PathBuf>, branch: &str) -> Result<Self> {
        let git = Self::new(repo_path);
        std::fs::create_dir_all(&git.repo_path)?;
        git.run(&["init", "--initial-branch", branch], "Failed to initialize git repository")?;
        git.config_user()?;
        git.commit_file("README", "initial\n", "Initial commit")?;
        Ok(git)
    }

    /// Configure a local identity so commits work on bare CI machines.
    pub fn config_user(&self) -> Result<()> {
        self.run(&["config", "user.email", "test@deps-pin.example"], "Failed to configure git user email")?;
        self.run(&["config", "user.name", "Test User"], "Failed to configure git user name")?;
        self.run(&["config", "commit.gpgsign", "false"], "Failed to disable commit signing")?;
        Ok(())
    }

    /// Write a file and commit it.
    pub fn commit_file(&self, name: &str, content: &str, message: &str) -> Result<()> {
        std::fs::write(self.repo_path.join(name), content)?;
        self.run(&["add", name], "Failed to add file to git")?;
        self.run(&["commit", "-m", message], "Failed to create git commit")?;
        Ok(())
    }

    /// Create and check out a branch at the current commit.
    pub fn create_branch(&self, branch: &str) -> Result<()> {
        self.run(&["checkout", "-b", branch], &format!("Failed to create branch: {branch}"))?;
        Ok(())
    }

    /// Full hash of HEAD.
    pub fn head_sha(&self) -> Result<String> {
        let output = self.run(&["rev-parse", "HEAD"], "Failed to get current commit SHA")?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Remote URL string for specs.
    pub fn url(&self) -> String {
        self.repo_path.display().to_string()
    }
}
