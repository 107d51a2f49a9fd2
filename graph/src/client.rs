use crate::config::GraphConfig;
use crate::permissions::PermissionEntry;
use crate::token::TokenProvider;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::path::Path;
use sw_core::error::{QueryError, QueryResult};
use sw_core::traits::AccessClient;
use sw_core::types::{PermissionSnapshot, ResourceId};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Microsoft Graph drive client.
///
/// Borrows the bearer token from the [`TokenProvider`] on every call and
/// never caches it, so a re-login takes effect on the next request.
pub struct GraphClient {
    http_client: Client,
    config: GraphConfig,
    tokens: TokenProvider,
}

impl GraphClient {
    pub fn new(config: GraphConfig, tokens: TokenProvider) -> QueryResult<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(QueryError::transport)?;

        Ok(Self {
            http_client,
            config,
            tokens,
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, url: &str) -> QueryResult<T> {
        let token = self.tokens.token().await?;
        debug!(url = %url, "Making Microsoft Graph API request");

        let response = self
            .http_client
            .get(url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(QueryError::transport)?;

        match response.status() {
            StatusCode::OK => {
                let body = response.json::<T>().await.map_err(QueryError::transport)?;
                Ok(body)
            }
            StatusCode::UNAUTHORIZED => Err(QueryError::Unauthorized),
            StatusCode::NOT_FOUND => Err(QueryError::NotFound(url.to_string())),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);
                Err(QueryError::RateLimited {
                    retry_after_seconds: retry_after,
                })
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(QueryError::Api {
                    status: status.as_u16(),
                    message: body,
                })
            }
        }
    }

    /// Names of the children of the drive root.
    pub async fn list_files(&self) -> QueryResult<Vec<String>> {
        let url = format!("{}/me/drive/root/children", self.config.base_url);
        let response: GraphListResponse<DriveItem> = self.get(&url).await?;
        Ok(response.value.into_iter().map(|item| item.name).collect())
    }

    /// Resolves the pre-authenticated download URL for a drive item.
    pub async fn download_url(&self, resource: &ResourceId) -> QueryResult<String> {
        let url = format!(
            "{}/me/drive/root:/{}",
            self.config.base_url,
            resource.as_str()
        );
        let item: DriveItem = self.get(&url).await?;
        item.download_url
            .ok_or_else(|| QueryError::Download(format!("no download URL for {}", resource)))
    }

    /// Streams the file content to `dest`. The download URL is
    /// pre-authenticated by Graph, so no bearer token is attached.
    pub async fn download_to(&self, resource: &ResourceId, dest: &Path) -> QueryResult<u64> {
        let url = self.download_url(resource).await?;
        let mut response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(QueryError::transport)?;

        if !response.status().is_success() {
            return Err(QueryError::Download(format!(
                "failed to download {}: {}",
                resource,
                response.status()
            )));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| QueryError::Download(format!("cannot create {}: {e}", dest.display())))?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(QueryError::transport)? {
            file.write_all(&chunk)
                .await
                .map_err(|e| QueryError::Download(format!("write failed: {e}")))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| QueryError::Download(format!("flush failed: {e}")))?;

        debug!(resource = %resource, bytes = written, "file downloaded");
        Ok(written)
    }
}

#[async_trait]
impl AccessClient for GraphClient {
    async fn fetch_permissions(
        &self,
        resource: &ResourceId,
    ) -> QueryResult<PermissionSnapshot> {
        let url = format!(
            "{}/me/drive/root:/{}:/permissions",
            self.config.base_url,
            resource.as_str()
        );
        let response: GraphListResponse<PermissionEntry> = self.get(&url).await?;

        // Unresolvable entries (link grants etc.) drop out here; collecting
        // into the snapshot collapses duplicate grantees to one principal.
        Ok(response
            .value
            .iter()
            .filter_map(PermissionEntry::principal)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct GraphListResponse<T> {
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct DriveItem {
    name: String,
    #[serde(rename = "@microsoft.graph.downloadUrl")]
    download_url: Option<String>,
}
