//! Modrinth v2 API client: version lookup and file download.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::config::Loader;
use crate::error::UpdaterError;

/// Production API base URL.
pub const MODRINTH_API: &str = "https://api.modrinth.com/v2";

/// Timeout for version list requests.
const API_TIMEOUT: Duration = Duration::from_secs(15);
/// Timeout for jar downloads.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// A single published version of a Modrinth project.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectVersion {
    /// Version identifier string (e.g. "0.5.8+mc1.20.1").
    pub version_number: String,
    /// Files attached to this version; the first is the primary jar.
    pub files: Vec<VersionFile>,
}

impl ProjectVersion {
    /// The primary downloadable file, if the version has any.
    pub fn primary_file(&self) -> Option<&VersionFile> {
        self.files.first()
    }
}

/// A downloadable file attached to a project version.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionFile {
    /// Filename as published (used for up-to-date comparison).
    pub filename: String,
    /// Direct download URL.
    pub url: String,
}

/// Modrinth API client with separate API and download timeouts.
pub struct ModrinthClient {
    api_base: String,
    api_client: Client,
    download_client: Client,
}

impl ModrinthClient {
    /// Create a client against the production API.
    pub fn new() -> Result<Self, UpdaterError> {
        Self::with_api_base(MODRINTH_API)
    }

    /// Create a client against a custom API base (used in tests).
    pub fn with_api_base(api_base: impl Into<String>) -> Result<Self, UpdaterError> {
        let api_client = Client::builder()
            .timeout(API_TIMEOUT)
            .build()
            .map_err(|e| UpdaterError::Config(format!("cannot build http client: {}", e)))?;
        let download_client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| UpdaterError::Config(format!("cannot build http client: {}", e)))?;
        Ok(Self {
            api_base: api_base.into(),
            api_client,
            download_client,
        })
    }

    /// Find the newest version compatible with the game version and loader.
    ///
    /// Release versions are preferred; beta is queried only when no
    /// release matches. Versions without files are skipped.
    pub async fn latest_compatible(
        &self,
        slug: &str,
        game_version: &str,
        loader: Loader,
    ) -> Result<ProjectVersion, UpdaterError> {
        let mut versions = self
            .list_versions(slug, game_version, loader, "release")
            .await?;
        if versions.is_empty() {
            tracing::debug!(slug = slug, "no release version, trying beta");
            versions = self.list_versions(slug, game_version, loader, "beta").await?;
        }

        versions
            .into_iter()
            .find(|v| !v.files.is_empty())
            .ok_or_else(|| UpdaterError::NoCompatibleVersion {
                slug: slug.to_owned(),
                game_version: game_version.to_owned(),
                loader: loader.as_str().to_owned(),
            })
    }

    /// Query the version list endpoint for one version type.
    async fn list_versions(
        &self,
        slug: &str,
        game_version: &str,
        loader: Loader,
        version_type: &str,
    ) -> Result<Vec<ProjectVersion>, UpdaterError> {
        let url = format!("{}/project/{}/version", self.api_base, slug);
        // Modrinth expects list parameters as JSON arrays
        let game_versions = serde_json::to_string(&[game_version])?;
        let loaders = serde_json::to_string(&[loader.as_str()])?;

        let response = self
            .api_client
            .get(&url)
            .query(&[
                ("game_versions", game_versions.as_str()),
                ("loaders", loaders.as_str()),
                ("version_type", version_type),
            ])
            .send()
            .await
            .map_err(|e| UpdaterError::ApiRequest {
                slug: slug.to_owned(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpdaterError::ApiRejected {
                slug: slug.to_owned(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Vec<ProjectVersion>>()
            .await
            .map_err(|e| UpdaterError::ApiRequest {
                slug: slug.to_owned(),
                reason: format!("invalid response body: {}", e),
            })
    }

    /// Download a version file and return its bytes.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, UpdaterError> {
        let response = self
            .download_client
            .get(url)
            .send()
            .await
            .map_err(|e| UpdaterError::Download {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdaterError::Download {
                url: url.to_owned(),
                reason: format!("status {}", status),
            });
        }

        let bytes = response.bytes().await.map_err(|e| UpdaterError::Download {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}
