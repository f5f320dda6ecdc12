//! Resolution results.

use std::fmt;

use crate::archive::ArchiveType;
use crate::constants::SHORT_COMMIT_LEN;
use crate::manifest::Extras;

/// The immutable reference a dependency was resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Full commit hash
    Commit(String),
    /// Release tag
    Tag(String),
    /// Registry package version
    Version(String),
}

impl Reference {
    /// The full reference string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Commit(s) | Self::Tag(s) | Self::Version(s) => s,
        }
    }

    /// Short human-readable form: commits are abbreviated, everything else is
    /// shown as-is.
    #[must_use]
    pub fn short(&self) -> String {
        match self {
            Self::Commit(sha) => sha.chars().take(SHORT_COMMIT_LEN).collect(),
            Self::Tag(s) | Self::Version(s) => s.clone(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short())
    }
}

/// Where the build orchestrator fetches the dependency from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// An archive extracted under `strip_prefix`.
    Archive {
        /// Download URL
        url: String,
        /// Extraction type
        archive_type: ArchiveType,
        /// Leading directory removed on extraction, possibly empty
        strip_prefix: String,
        /// Content hash
        sha256: String,
    },
    /// A single executable file.
    Executable {
        /// Download URL
        url: String,
        /// Content hash
        sha256: String,
    },
    /// A remote checked out by the orchestrator at [`ResolvedDependency::reference`].
    GitCheckout {
        /// Remote URL
        remote: String,
    },
}

impl Artifact {
    /// Checksum, when the artifact carries one.
    #[must_use]
    pub fn sha256(&self) -> Option<&str> {
        match self {
            Self::Archive {
                sha256,
                ..
            }
            | Self::Executable {
                sha256,
                ..
            } => Some(sha256),
            Self::GitCheckout {
                ..
            } => None,
        }
    }
}

/// A pinned reference that lags behind upstream. Informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    /// Reference that was emitted
    pub pinned: Reference,
    /// What upstream currently offers
    pub latest: Reference,
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frozen, update available {} -> {}", self.pinned, self.latest)
    }
}

/// Compare a pin against the latest upstream reference.
///
/// Returns the reference to emit and the drift, if any. Without a pin the
/// latest reference is used and there is nothing to report.
pub(crate) fn pinned_or_latest(
    pinned: Option<&str>,
    latest: String,
    kind: fn(String) -> Reference,
) -> (Reference, Option<Drift>) {
    match pinned {
        None => (kind(latest), None),
        Some(pin) if pin == latest => (kind(latest), None),
        Some(pin) => {
            let pinned = kind(pin.to_string());
            let drift = Drift {
                pinned: pinned.clone(),
                latest: kind(latest),
            };
            (pinned, Some(drift))
        }
    }
}

/// Output of the resolver for one dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    /// Dependency name as declared
    pub name: String,
    /// Emitted macro name (`dep_` + name with dashes replaced)
    pub macro_name: String,
    /// Resolved commit, tag or version
    pub reference: Reference,
    /// Download or checkout description
    pub artifact: Artifact,
    /// Attributes forwarded from the dependency record
    pub extras: Extras,
    /// Set when a pin lags behind upstream
    pub drift: Option<Drift>,
}
