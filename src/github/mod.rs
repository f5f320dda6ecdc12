//! Code-forge API client.
//!
//! Covers the three lookups the resolver needs: the head commit of a branch,
//! the latest published release, and a release by tag. All calls go through
//! [`HttpClient::get_api_json`], so they carry the access token when one was
//! provided and surface throttling as [`PinError::RateLimited`].

use serde::Deserialize;

use crate::core::PinError;
use crate::net::HttpClient;

/// Commit object; only the hash is used.
#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    /// Full commit hash
    pub sha: String,
}

/// A release asset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    /// File name of the asset
    pub name: String,
    /// Public download URL
    pub browser_download_url: String,
}

/// Release metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Tag the release was cut from
    pub tag_name: String,
    /// Uploaded assets, in forge order
    #[serde(default)]
    pub assets: Vec<Asset>,
    /// Source tarball of the tag, when the forge provides one
    #[serde(default)]
    pub tarball_url: Option<String>,
}

/// Client for one forge API root.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: HttpClient,
    api_base: String,
}

impl GitHubClient {
    /// Create a client for an API root such as `https://api.github.com`.
    #[must_use]
    pub fn new(http: HttpClient, api_base: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Head commit hash of `branch`.
    pub async fn latest_commit(&self, owner: &str, repo: &str, branch: &str) -> Result<String, PinError> {
        let url = format!("{}/repos/{owner}/{repo}/commits/{branch}", self.api_base);
        let commit: Commit = self.http.get_api_json(&url).await?;
        Ok(commit.sha)
    }

    /// Latest non-prerelease release. Repositories that only have
    /// pre-releases answer 404.
    pub async fn latest_release(&self, owner: &str, repo: &str) -> Result<Release, PinError> {
        let url = format!("{}/repos/{owner}/{repo}/releases/latest", self.api_base);
        self.http.get_api_json(&url).await
    }

    /// Release for a specific tag.
    pub async fn release_by_tag(&self, owner: &str, repo: &str, tag: &str) -> Result<Release, PinError> {
        let url = format!("{}/repos/{owner}/{repo}/releases/tags/{tag}", self.api_base);
        self.http.get_api_json(&url).await
    }
}
