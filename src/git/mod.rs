//! Remote git lookups.
//!
//! The `git_clone` strategy never clones: it asks the remote for the head of a
//! branch with `git ls-remote` and records the remote URL plus that commit.

pub mod command_builder;

pub use command_builder::GitCommand;

use crate::core::PinError;

/// Head commit of `branch` on the remote at `url`.
pub async fn branch_head(url: &str, branch: &str) -> Result<String, PinError> {
    let refname = format!("refs/heads/{branch}");
    let stdout = GitCommand::ls_remote(url, &refname)
        .with_context(format!("resolving {branch}"))
        .execute_stdout()
        .await?;

    parse_ls_remote(&stdout, &refname).ok_or_else(|| PinError::RefNotFound {
        url: url.to_string(),
        branch: branch.to_string(),
    })
}

/// Commit hash of exactly `refname` in `ls-remote` output (`<sha>\t<ref>`
/// lines). `ls-remote` patterns match ref suffixes, so other refs ending in the
/// same name may be listed too.
#[must_use]
pub fn parse_ls_remote(output: &str, refname: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (sha, name) = line.split_once(char::is_whitespace)?;
        (name.trim() == refname).then(|| sha.to_string())
    })
}
