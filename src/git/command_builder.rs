//! Type-safe Git command builder for consistent command execution
//!
//! Only `ls-remote` is needed today, but every git invocation goes through
//! [`GitCommand`] so logging and error mapping stay in one place.

use std::process::Stdio;
use tokio::process::Command;

use crate::core::PinError;

/// Builder for a single git invocation with captured output.
///
/// # Examples
///
/// ```rust,no_run
/// use deps_pin::git::command_builder::GitCommand;
///
/// # async fn example() -> Result<(), deps_pin::core::PinError> {
/// let heads = GitCommand::ls_remote("https://example.com/repo.git", "refs/heads/main")
///     .with_context("checking v8")
///     .execute_stdout()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct GitCommand {
    /// Arguments passed to git, in order
    args: Vec<String>,

    /// Environment variables set for the git process
    env_vars: Vec<(String, String)>,

    /// Optional context string for log lines
    context: Option<String>,
}

impl GitCommand {
    /// Creates an empty command.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Adds multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets an environment variable for this invocation only.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Attaches a context string shown in debug logs.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Arguments as they will be passed to git.
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Runs the command and returns its output; non-zero exit is an error.
    pub async fn execute(self) -> Result<GitCommandOutput, PinError> {
        let start = std::time::Instant::now();
        let operation = self.args.first().cloned().unwrap_or_else(|| "unknown".to_string());

        if let Some(ref ctx) = self.context {
            tracing::debug!(target: "git", "({}) Executing command: git {}", ctx, self.args.join(" "));
        } else {
            tracing::debug!(target: "git", "Executing command: git {}", self.args.join(" "));
        }

        let mut cmd = Command::new("git");
        cmd.args(&self.args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
        for (key, value) in &self.env_vars {
            tracing::trace!(target: "git", "Setting env var: {}={}", key, value);
            cmd.env(key, value);
        }

        let output = cmd.output().await.map_err(|e| PinError::GitCommandError {
            operation: operation.clone(),
            stderr: format!("failed to run git: {e}"),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::debug!(
                target: "git",
                "Command failed with exit code: {:?}",
                output.status.code()
            );
            return Err(PinError::GitCommandError {
                operation,
                stderr: if stderr.is_empty() {
                    stdout
                } else {
                    stderr
                },
            });
        }

        if !stderr.is_empty() {
            tracing::debug!(target: "git", "{}", stderr.trim());
        }
        tracing::debug!(
            target: "git::perf",
            "Git {} took {}ms",
            operation,
            start.elapsed().as_millis()
        );

        Ok(GitCommandOutput {
            stdout,
        })
    }

    /// Runs the command and returns trimmed stdout.
    pub async fn execute_stdout(self) -> Result<String, PinError> {
        let output = self.execute().await?;
        Ok(output.stdout.trim().to_string())
    }
}

/// Captured output of a successful git invocation.
#[derive(Debug)]
pub struct GitCommandOutput {
    /// Standard output
    pub stdout: String,
}

impl GitCommand {
    /// `git ls-remote <url> <pattern>` without credential prompts.
    pub fn ls_remote(url: &str, pattern: &str) -> Self {
        Self::new().args(["ls-remote", url, pattern]).env("GIT_TERMINAL_PROMPT", "0")
    }
}
