//! Branch head of an arbitrary git remote. Nothing is downloaded or hashed;
//! the orchestrator checks the commit out itself.

use super::Resolver;
use super::types::{Artifact, Drift, Reference, pinned_or_latest};
use crate::core::PinError;
use crate::git;
use crate::manifest::Pin;

impl Resolver {
    pub(super) async fn resolve_git_clone(
        &self,
        url: &str,
        branch: &str,
        pin: &Pin,
    ) -> Result<(Reference, Artifact, Option<Drift>), PinError> {
        let latest = git::branch_head(url, branch).await?;
        let (commit, drift) = pinned_or_latest(pin.freeze_commit.as_deref(), latest, Reference::Commit);
        let artifact = Artifact::GitCheckout {
            remote: url.to_string(),
        };
        Ok((commit, artifact, drift))
    }
}
