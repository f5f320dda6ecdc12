//! One artifact out of a tagged release.
//!
//! Release lookup:
//!
//! - no `freeze_version`: the latest release, any failure propagates
//! - with `freeze_version`: the latest release is still fetched for drift
//!   reporting, but a 404 there (repositories with only pre-releases) is
//!   tolerated; the frozen tag is then fetched and used
//!
//! Asset selection never guesses: exactly one asset must survive the
//! `file_regex` filter, or none at all when the release offers a source
//! tarball to fall back on.

use tracing::{debug, info};

use super::Resolver;
use super::types::{Artifact, Drift, Reference};
use crate::archive::{self, ArchiveType};
use crate::core::{AssetProblem, PinError};
use crate::github::Release;
use crate::manifest::{AssetPattern, FileType, Pin};
use crate::net::sha256_hex;

/// Pick the download URL out of a release.
pub fn select_asset_url(
    name: &str,
    release: &Release,
    file_regex: Option<&AssetPattern>,
) -> Result<String, PinError> {
    let matching: Vec<_> = release
        .assets
        .iter()
        .filter(|asset| file_regex.is_none_or(|pattern| pattern.matches(&asset.name)))
        .collect();

    match matching.as_slice() {
        [] => release.tarball_url.clone().ok_or_else(|| PinError::AmbiguousOrMissingAssets {
            name: name.to_string(),
            problem: AssetProblem::NoneFound {
                tag: release.tag_name.clone(),
                file_regex: file_regex.map(|pattern| pattern.as_str().to_string()),
            },
        }),
        [asset] => Ok(asset.browser_download_url.clone()),
        several => Err(PinError::AmbiguousOrMissingAssets {
            name: name.to_string(),
            problem: AssetProblem::Ambiguous {
                candidates: several.iter().map(|a| a.name.clone()).collect(),
            },
        }),
    }
}

impl Resolver {
    #[allow(clippy::too_many_arguments)]
    pub(super) async fn resolve_github_release(
        &self,
        name: &str,
        owner: &str,
        repo: &str,
        file_regex: Option<&AssetPattern>,
        file_type: FileType,
        strip_prefix: Option<&str>,
        pin: &Pin,
    ) -> Result<(Reference, Artifact, Option<Drift>), PinError> {
        let (release, drift) = self.find_release(owner, repo, pin).await?;
        let reference = Reference::Tag(release.tag_name.clone());

        let url = select_asset_url(name, &release, file_regex)?;
        debug!(url = %url, tag = %release.tag_name, "selected release artifact");

        let needs_listing = file_type == FileType::Archive && strip_prefix.is_none();
        let content = if pin.freeze_sha256.is_some() && !needs_listing {
            debug!(url = %url, "checksum pinned and no prefix needed, skipping download");
            None
        } else {
            Some(self.http.download(&url).await?)
        };
        let bytes = content.as_deref().unwrap_or_default();

        let sha256 = match &pin.freeze_sha256 {
            Some(sha) => sha.clone(),
            None => sha256_hex(bytes),
        };

        let artifact = match file_type {
            FileType::Executable => Artifact::Executable {
                url,
                sha256,
            },
            FileType::Archive => {
                let strip_prefix = match strip_prefix {
                    Some(prefix) => prefix.to_string(),
                    None => archive::common_prefix(bytes).map_err(|e| PinError::Archive {
                        url: url.clone(),
                        reason: e.to_string(),
                    })?,
                };
                Artifact::Archive {
                    archive_type: ArchiveType::from_url(&url),
                    url,
                    strip_prefix,
                    sha256,
                }
            }
        };
        Ok((reference, artifact, drift))
    }

    async fn find_release(
        &self,
        owner: &str,
        repo: &str,
        pin: &Pin,
    ) -> Result<(Release, Option<Drift>), PinError> {
        let Some(frozen_tag) = pin.freeze_version.as_deref() else {
            return Ok((self.github.latest_release(owner, repo).await?, None));
        };

        let latest = match self.github.latest_release(owner, repo).await {
            Ok(release) => Some(release),
            Err(e) if e.is_not_found() => {
                info!(owner, repo, "no published release, using frozen tag {frozen_tag}");
                None
            }
            Err(e) => return Err(e),
        };

        let frozen = self.github.release_by_tag(owner, repo, frozen_tag).await?;
        let drift = latest.filter(|l| l.tag_name != frozen.tag_name).map(|l| Drift {
            pinned: Reference::Tag(frozen.tag_name.clone()),
            latest: Reference::Tag(l.tag_name),
        });
        Ok((frozen, drift))
    }
}
