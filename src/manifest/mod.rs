//! Dependency list loading and per-dependency specifications.
//!
//! A dependency list is a relaxed-JSON file (`//` comments allowed) with a
//! single `repositories` array. Each element describes one external dependency:
//!
//! ```text
//! {
//!   "repositories": [
//!     // Pinned to a commit on a branch
//!     { "name": "capnp-cpp", "type": "github_tarball", "owner": "capnproto",
//!       "repo": "capnproto", "branch": "v2", "extra_strip_prefix": "/c++" },
//!     // One asset out of the latest release
//!     { "name": "ruff", "type": "github_release", "owner": "astral-sh", "repo": "ruff",
//!       "file_regex": "ruff-x86_64-unknown-linux-gnu.tar.gz$" },
//!     // A branch head of any git remote
//!     { "name": "v8", "type": "git_clone", "url": "https://chromium.googlesource.com/v8/v8.git",
//!       "branch": "13.1-lkgr" },
//!     // Newest version on the registry
//!     { "name": "cxxbridge-cmd", "type": "crate", "freeze_version": "1.0.129" }
//!   ]
//! }
//! ```
//!
//! # Lazy Parsing
//!
//! [`DependencyList`] only validates that each record has a `name`. The rest of
//! the record is parsed into a [`DependencySpec`] when that dependency is
//! processed, so a record with an unsupported `type` fails at its own position
//! in the run and does not stop a filtered run that skips it.

pub mod jsonc;

use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;

use crate::constants::{DEFAULT_BRANCH, MACRO_PREFIX};
use crate::core::PinError;

pub use jsonc::strip_comments;

/// Derive the emitted macro name for a dependency name.
///
/// ```
/// use deps_pin::manifest::macro_name;
/// assert_eq!(macro_name("capnp-cpp"), "dep_capnp_cpp");
/// ```
#[must_use]
pub fn macro_name(name: &str) -> String {
    format!("{MACRO_PREFIX}{}", name.replace('-', "_"))
}

/// Top-level object of a dependency list file.
#[derive(Debug, Clone, Deserialize)]
pub struct DependencyList {
    /// Declared dependencies in file order.
    pub repositories: Vec<RawDependency>,
}

impl DependencyList {
    /// Parse list text after stripping comments. `file` is only used in errors.
    pub fn parse_str(text: &str, file: &str) -> Result<Self, PinError> {
        let json = strip_comments(text);
        serde_json::from_str(&json).map_err(|e| PinError::SpecParse {
            file: file.to_string(),
            reason: e.to_string(),
        })
    }

    /// Read and parse a list file.
    pub async fn load(path: &Path) -> Result<Self, PinError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PinError::io("reading", path, &e))?;
        Self::parse_str(&text, &path.display().to_string())
    }

    /// Macro names of every declared dependency, in declaration order.
    #[must_use]
    pub fn macro_names(&self) -> Vec<String> {
        self.repositories.iter().map(RawDependency::macro_name).collect()
    }
}

/// One record as written in the list, not yet interpreted.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDependency {
    /// Unique dependency name.
    pub name: String,
    /// Every other field of the record.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RawDependency {
    /// Emitted macro name of this dependency.
    #[must_use]
    pub fn macro_name(&self) -> String {
        macro_name(&self.name)
    }

    /// Interpret the record.
    pub fn parse(&self) -> Result<DependencySpec, PinError> {
        let type_name = match self.fields.get("type") {
            Some(Value::String(t)) => t.as_str(),
            Some(other) => return Err(self.invalid(format!("\"type\" must be a string, got {other}"))),
            None => return Err(self.invalid("missing \"type\"".to_string())),
        };

        let source = match type_name {
            "github_tarball" => {
                let f: TarballFields = self.fields_as()?;
                Source::GithubTarball {
                    owner: f.owner,
                    repo: f.repo,
                    branch: f.branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
                    extra_strip_prefix: f.extra_strip_prefix,
                }
            }
            "github_release" => {
                let f: ReleaseFields = self.fields_as()?;
                let file_type = match f.file_type.as_deref() {
                    None | Some("archive") => FileType::Archive,
                    Some("executable") => FileType::Executable,
                    Some(other) => {
                        return Err(PinError::UnsupportedStrategy {
                            name: self.name.clone(),
                            field: "file_type".to_string(),
                            value: other.to_string(),
                        });
                    }
                };
                let file_regex = f
                    .file_regex
                    .map(|pattern| AssetPattern::new(&pattern))
                    .transpose()
                    .map_err(|e| self.invalid(format!("bad file_regex: {e}")))?;
                Source::GithubRelease {
                    owner: f.owner,
                    repo: f.repo,
                    file_regex,
                    file_type,
                    strip_prefix: f.strip_prefix,
                }
            }
            "git_clone" => {
                let f: GitFields = self.fields_as()?;
                Source::GitClone {
                    url: f.url,
                    branch: f.branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
                }
            }
            "crate" => Source::Crate,
            other => {
                return Err(PinError::UnsupportedStrategy {
                    name: self.name.clone(),
                    field: "type".to_string(),
                    value: other.to_string(),
                });
            }
        };

        Ok(DependencySpec {
            name: self.name.clone(),
            source,
            pin: self.fields_as()?,
            extras: self.fields_as()?,
        })
    }

    fn fields_as<T: DeserializeOwned>(&self) -> Result<T, PinError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| self.invalid(e.to_string()))
    }

    fn invalid(&self, reason: String) -> PinError {
        PinError::InvalidSpec {
            name: self.name.clone(),
            reason,
        }
    }
}

#[derive(Deserialize)]
struct TarballFields {
    owner: String,
    repo: String,
    branch: Option<String>,
    extra_strip_prefix: Option<String>,
}

#[derive(Deserialize)]
struct ReleaseFields {
    owner: String,
    repo: String,
    file_regex: Option<String>,
    file_type: Option<String>,
    strip_prefix: Option<String>,
}

#[derive(Deserialize)]
struct GitFields {
    url: String,
    branch: Option<String>,
}

/// A fully interpreted dependency record.
#[derive(Debug, Clone)]
pub struct DependencySpec {
    /// Unique dependency name.
    pub name: String,
    /// How the dependency is resolved.
    pub source: Source,
    /// Freeze overrides.
    pub pin: Pin,
    /// Attributes forwarded verbatim into the emitted rule.
    pub extras: Extras,
}

impl DependencySpec {
    /// Emitted macro name of this dependency.
    #[must_use]
    pub fn macro_name(&self) -> String {
        macro_name(&self.name)
    }
}

/// Resolution strategy, one variant per supported `type`.
#[derive(Debug, Clone)]
pub enum Source {
    /// Source tarball of the latest commit on a branch.
    GithubTarball {
        /// Repository owner
        owner: String,
        /// Repository name
        repo: String,
        /// Branch to follow
        branch: String,
        /// Appended to the computed archive prefix
        extra_strip_prefix: Option<String>,
    },
    /// An asset (or the source tarball) of a tagged release.
    GithubRelease {
        /// Repository owner
        owner: String,
        /// Repository name
        repo: String,
        /// Asset name filter
        file_regex: Option<AssetPattern>,
        /// Archive or single executable
        file_type: FileType,
        /// Explicit prefix; skips archive inspection
        strip_prefix: Option<String>,
    },
    /// Head of a branch on an arbitrary git remote.
    GitClone {
        /// Remote URL
        url: String,
        /// Branch to follow
        branch: String,
    },
    /// Newest version of a registry package named after the dependency.
    Crate,
}

impl Source {
    /// The `type` string this variant was parsed from.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::GithubTarball {
                ..
            } => "github_tarball",
            Self::GithubRelease {
                ..
            } => "github_release",
            Self::GitClone {
                ..
            } => "git_clone",
            Self::Crate => "crate",
        }
    }
}

/// What a release artifact is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    /// An archive extracted by the build orchestrator.
    #[default]
    Archive,
    /// A single downloadable executable.
    Executable,
}

/// Asset name filter, anchored at the start of the name.
#[derive(Debug, Clone)]
pub struct AssetPattern {
    source: String,
    regex: Regex,
}

impl AssetPattern {
    /// Compile a pattern. Matching is anchored at the start of the asset name
    /// but not at the end.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: pattern.to_string(),
            regex: Regex::new(&format!("^(?:{pattern})"))?,
        })
    }

    /// Whether the asset name matches.
    #[must_use]
    pub fn matches(&self, asset_name: &str) -> bool {
        self.regex.is_match(asset_name)
    }

    /// The pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Freeze overrides. When set, the emitted value equals the pinned one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Pin {
    /// Commit to use instead of the branch head.
    pub freeze_commit: Option<String>,
    /// Checksum to emit instead of hashing the download.
    pub freeze_sha256: Option<String>,
    /// Release tag or package version to use instead of the newest.
    pub freeze_version: Option<String>,
}

/// Rule attributes forwarded unmodified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Extras {
    /// Label of a BUILD file overlaid on the download.
    pub build_file: Option<String>,
    /// Inline BUILD file content.
    pub build_file_content: Option<String>,
    /// Repository name remapping, kept as written (key order included).
    pub repo_mapping: Option<Value>,
    /// Patch labels applied after extraction.
    pub patches: Option<Vec<String>>,
    /// File name for single-file downloads.
    pub downloaded_file_path: Option<String>,
}
