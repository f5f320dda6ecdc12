//! Newest (or frozen) version of a registry package.
//!
//! The registry's checksum is emitted as-is; the package archive itself is
//! never fetched.

use semver::Version;
use tracing::warn;

use super::Resolver;
use super::types::{Artifact, Drift, Reference};
use crate::archive::ArchiveType;
use crate::core::PinError;
use crate::manifest::Pin;
use crate::registry::CrateVersion;

/// Choose the version to emit out of a newest-first listing.
pub fn select_version<'a>(
    name: &str,
    versions: &'a [CrateVersion],
    frozen: Option<&str>,
) -> Result<(&'a CrateVersion, Option<Drift>), PinError> {
    let newest = versions.first().ok_or_else(|| PinError::InvalidResponse {
        url: format!("crate {name}"),
        reason: "registry lists no versions".to_string(),
    })?;

    let Some(frozen) = frozen else {
        return Ok((newest, None));
    };

    let chosen = versions.iter().find(|v| v.num == frozen).ok_or_else(|| PinError::FrozenVersionNotFound {
        name: name.to_string(),
        version: frozen.to_string(),
    })?;

    let drift = (chosen.num != newest.num).then(|| Drift {
        pinned: Reference::Version(chosen.num.clone()),
        latest: Reference::Version(newest.num.clone()),
    });
    Ok((chosen, drift))
}

impl Resolver {
    pub(super) async fn resolve_crate(
        &self,
        name: &str,
        pin: &Pin,
    ) -> Result<(Reference, Artifact, Option<Drift>), PinError> {
        let versions = self.registry.versions(name).await?;
        let (version, drift) = select_version(name, &versions, pin.freeze_version.as_deref())?;

        if version.yanked {
            warn!("{name} {} is yanked on the registry", version.num);
        }
        if let Some(drift) = &drift
            && is_newer(drift.pinned.as_str(), drift.latest.as_str())
        {
            warn!("{name}: frozen version {} is newer than the registry's first listed {}", drift.pinned, drift.latest);
        }

        let artifact = Artifact::Archive {
            url: self.registry.download_url(version),
            archive_type: ArchiveType::Tgz,
            strip_prefix: format!("{name}-{}", version.num),
            sha256: version.checksum.clone(),
        };
        Ok((Reference::Version(version.num.clone()), artifact, drift))
    }
}

fn is_newer(a: &str, b: &str) -> bool {
    match (Version::parse(a), Version::parse(b)) {
        (Ok(a), Ok(b)) => a > b,
        _ => false,
    }
}
