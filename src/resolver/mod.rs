//! Dependency resolution.
//!
//! The [`Resolver`] turns one [`DependencySpec`] into one [`ResolvedDependency`]:
//! an immutable reference (commit, tag or version), where to fetch it from and
//! its checksum. There is one strategy per [`Source`] variant:
//!
//! | Source | Reference | Checksum |
//! |---|---|---|
//! | `github_tarball` | branch head commit | hash of the downloaded tarball |
//! | `github_release` | release tag | hash of the downloaded asset |
//! | `git_clone` | branch head via `git ls-remote` | none |
//! | `crate` | newest registry version | registry-provided |
//!
//! # Pins
//!
//! `freeze_commit`, `freeze_version` and `freeze_sha256` always win. Upstream is
//! still queried so a lagging pin can be reported as [`Drift`], which is
//! informational and never fails resolution.
//!
//! # Example
//!
//! ```rust,no_run
//! use deps_pin::config::Settings;
//! use deps_pin::manifest::DependencyList;
//! use deps_pin::resolver::Resolver;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = Settings::new("build/deps");
//! let resolver = Resolver::new(&settings)?;
//! let list = DependencyList::parse_str(r#"{"repositories": [{"name": "serde", "type": "crate"}]}"#, "inline")?;
//! let spec = list.repositories[0].parse()?;
//! let resolved = resolver.resolve(&spec).await?;
//! println!("{} -> {}", resolved.name, resolved.reference);
//! # Ok(())
//! # }
//! ```

mod crate_registry;
mod git_clone;
mod github_release;
mod github_tarball;
pub mod types;

pub use crate_registry::select_version;
pub use github_release::select_asset_url;
pub use types::{Artifact, Drift, Reference, ResolvedDependency};

use tracing::{debug, info};

use crate::config::Settings;
use crate::core::PinError;
use crate::github::GitHubClient;
use crate::manifest::{DependencySpec, Source};
use crate::net::HttpClient;
use crate::registry::RegistryClient;

/// Resolves dependency specs against the configured upstreams.
///
/// Holds no state between calls; the access token is fixed at construction.
#[derive(Debug, Clone)]
pub struct Resolver {
    http: HttpClient,
    github: GitHubClient,
    registry: RegistryClient,
    web_base: String,
}

impl Resolver {
    /// Build a resolver from run settings.
    pub fn new(settings: &Settings) -> Result<Self, PinError> {
        let endpoints = &settings.tool.endpoints;
        let http = HttpClient::new(settings.github_token.clone())?;
        Ok(Self {
            github: GitHubClient::new(http.clone(), &endpoints.github_api),
            registry: RegistryClient::new(http.clone(), &endpoints.crates_io),
            web_base: endpoints.github_web.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Resolve one dependency.
    pub async fn resolve(&self, spec: &DependencySpec) -> Result<ResolvedDependency, PinError> {
        debug!(name = %spec.name, kind = spec.source.type_name(), "resolving");

        let (reference, artifact, drift) = match &spec.source {
            Source::GithubTarball {
                owner,
                repo,
                branch,
                extra_strip_prefix,
            } => {
                self.resolve_github_tarball(owner, repo, branch, extra_strip_prefix.as_deref(), &spec.pin)
                    .await?
            }
            Source::GithubRelease {
                owner,
                repo,
                file_regex,
                file_type,
                strip_prefix,
            } => {
                self.resolve_github_release(
                    &spec.name,
                    owner,
                    repo,
                    file_regex.as_ref(),
                    *file_type,
                    strip_prefix.as_deref(),
                    &spec.pin,
                )
                .await?
            }
            Source::GitClone {
                url,
                branch,
            } => self.resolve_git_clone(url, branch, &spec.pin).await?,
            Source::Crate => self.resolve_crate(&spec.name, &spec.pin).await?,
        };

        info!(name = %spec.name, reference = %reference.as_str(), "resolved");

        Ok(ResolvedDependency {
            name: spec.name.clone(),
            macro_name: spec.macro_name(),
            reference,
            artifact,
            extras: spec.extras.clone(),
            drift,
        })
    }
}
