//! Package registry client (crates.io API).
//!
//! The registry lists every published version of a package, newest first,
//! together with its download path and SHA-256 checksum. The checksum is
//! trusted as-is; the package archive is never downloaded.

use serde::Deserialize;

use crate::core::PinError;
use crate::net::HttpClient;

/// One published version.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CrateVersion {
    /// Version number, e.g. `1.0.129`
    pub num: String,
    /// Download path relative to the registry root
    pub dl_path: String,
    /// SHA-256 of the `.crate` archive
    pub checksum: String,
    /// Whether the version was yanked
    #[serde(default)]
    pub yanked: bool,
}

#[derive(Debug, Deserialize)]
struct CrateResponse {
    versions: Vec<CrateVersion>,
}

/// Client for one registry root.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: HttpClient,
    base: String,
}

impl RegistryClient {
    /// Create a client for a registry root such as `https://crates.io`.
    #[must_use]
    pub fn new(http: HttpClient, base: &str) -> Self {
        Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// All published versions of `name`, newest first as ordered by the registry.
    pub async fn versions(&self, name: &str) -> Result<Vec<CrateVersion>, PinError> {
        let url = format!("{}/api/v1/crates/{name}", self.base);
        let response: CrateResponse = self.http.get_json(&url).await?;
        if response.versions.is_empty() {
            return Err(PinError::InvalidResponse {
                url,
                reason: "registry lists no versions".to_string(),
            });
        }
        Ok(response.versions)
    }

    /// Absolute download URL of a version.
    #[must_use]
    pub fn download_url(&self, version: &CrateVersion) -> String {
        format!("{}{}", self.base, version.dl_path)
    }
}
