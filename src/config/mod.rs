//! Run configuration for update-deps.
//!
//! Configuration comes from three places, in increasing order of precedence:
//!
//! 1. Built-in defaults (public forge and registry endpoints, the two standard
//!    dependency lists `deps.jsonc` and `build_deps.jsonc`)
//! 2. An optional `update-deps.toml` inside the deps directory, or the file
//!    passed with `--config`
//! 3. Command-line flags and environment (`--deps-dir`, `BUILD_WORKSPACE_DIRECTORY`,
//!    `--token` / `GITHUB_TOKEN`)
//!
//! # File Format
//!
//! ```toml
//! [endpoints]
//! github_api = "https://api.github.com"
//! github_web = "https://github.com"
//! crates_io = "https://crates.io"
//!
//! [[lists]]
//! spec = "deps.jsonc"
//! output = "deps.bzl"
//! ```
//!
//! The access token is never read from the file. It is threaded explicitly
//! through [`Settings`] into the HTTP layer so tests can construct a resolver
//! without touching stdin or the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_CRATES_IO, DEFAULT_GITHUB_API, DEFAULT_GITHUB_WEB, DEPS_SUBDIR,
    GEN_SUBDIR,
};

/// Base URLs of the upstream services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Forge REST API root (commits, releases).
    pub github_api: String,
    /// Forge web root used to build source tarball URLs.
    pub github_web: String,
    /// Package registry root.
    pub crates_io: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            github_api: DEFAULT_GITHUB_API.to_string(),
            github_web: DEFAULT_GITHUB_WEB.to_string(),
            crates_io: DEFAULT_CRATES_IO.to_string(),
        }
    }
}

impl Endpoints {
    /// Point every endpoint at one base URL. Used by tests against a mock server.
    #[must_use]
    pub fn single_host(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            github_api: base.clone(),
            github_web: base.clone(),
            crates_io: base,
        }
    }
}

/// One dependency list and the aggregate fragment generated from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListConfig {
    /// Relaxed-JSON spec file, relative to the deps directory.
    pub spec: String,
    /// Aggregate fragment file name, written under `gen/`.
    pub output: String,
}

fn default_lists() -> Vec<ListConfig> {
    vec![
        ListConfig {
            spec: "deps.jsonc".to_string(),
            output: "deps.bzl".to_string(),
        },
        ListConfig {
            spec: "build_deps.jsonc".to_string(),
            output: "build_deps.bzl".to_string(),
        },
    ]
}

/// Contents of `update-deps.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Upstream endpoints.
    #[serde(default)]
    pub endpoints: Endpoints,
    /// Dependency lists processed in order.
    #[serde(default = "default_lists")]
    pub lists: Vec<ListConfig>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            lists: default_lists(),
        }
    }
}

impl ToolConfig {
    /// Load configuration from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load the explicit config file if given (it must exist), otherwise
    /// `update-deps.toml` in the deps directory if present, otherwise defaults.
    pub async fn load(deps_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path).await;
        }

        let path = deps_dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }
}

/// Everything a run needs, assembled once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the spec files.
    pub deps_dir: PathBuf,
    /// Endpoints and lists.
    pub tool: ToolConfig,
    /// Forge API access token, if any.
    pub github_token: Option<String>,
}

impl Settings {
    /// Settings for a deps directory with default configuration and no token.
    #[must_use]
    pub fn new(deps_dir: impl Into<PathBuf>) -> Self {
        Self {
            deps_dir: deps_dir.into(),
            tool: ToolConfig::default(),
            github_token: None,
        }
    }

    /// Replace the endpoints.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.tool.endpoints = endpoints;
        self
    }

    /// Set the access token. Empty strings mean "no token".
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.github_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Directory receiving generated fragments.
    #[must_use]
    pub fn gen_dir(&self) -> PathBuf {
        self.deps_dir.join(GEN_SUBDIR)
    }
}

/// Work out the deps directory.
///
/// An explicit directory wins; otherwise `<workspace>/build/deps` when running
/// under `bazel run`; otherwise `build/deps` below the current directory.
#[must_use]
pub fn deps_dir_from(explicit: Option<PathBuf>, workspace: Option<OsString>, cwd: &Path) -> PathBuf {
    if let Some(dir) = explicit {
        return dir;
    }
    match workspace {
        Some(root) if !root.is_empty() => PathBuf::from(root).join(DEPS_SUBDIR),
        _ => cwd.join(DEPS_SUBDIR),
    }
}
