//! Source tarball of a branch head.

use tracing::debug;

use super::Resolver;
use super::types::{Artifact, Drift, Reference, pinned_or_latest};
use crate::archive::ArchiveType;
use crate::core::PinError;
use crate::manifest::Pin;
use crate::net::sha256_hex;

/// Directory the forge puts tarball members under, plus the optional suffix.
pub(crate) fn tarball_prefix(owner: &str, repo: &str, commit: &Reference, extra: Option<&str>) -> String {
    let mut prefix = format!("{owner}-{repo}-{}", commit.short());
    if let Some(extra) = extra {
        prefix.push_str(extra);
    }
    prefix
}

impl Resolver {
    pub(super) async fn resolve_github_tarball(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        extra_strip_prefix: Option<&str>,
        pin: &Pin,
    ) -> Result<(Reference, Artifact, Option<Drift>), PinError> {
        let latest = self.github.latest_commit(owner, repo, branch).await?;
        let (commit, drift) = pinned_or_latest(pin.freeze_commit.as_deref(), latest, Reference::Commit);

        let url = format!("{}/{}/{}/tarball/{}", self.web_base, owner, repo, commit.as_str());
        let sha256 = match &pin.freeze_sha256 {
            Some(sha) => sha.clone(),
            None => sha256_hex(&self.http.download(&url).await?),
        };
        debug!(url = %url, commit = %commit.as_str(), "resolved source tarball");

        let artifact = Artifact::Archive {
            strip_prefix: tarball_prefix(owner, repo, &commit, extra_strip_prefix),
            url,
            archive_type: ArchiveType::Tgz,
            sha256,
        };
        Ok((commit, artifact, drift))
    }
}
