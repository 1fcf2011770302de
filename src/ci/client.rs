//! Workspace listing and per-asset operations.

use reqwest::Method;

use super::requester::{AuthenticatedRequester, RequestBody};
use super::types::{AssetDetails, ContentItem, ContentsPage, DownloadLocation};
use super::Endpoints;
use crate::error::Result;

/// List, detail, delete and download-URL calls against the API host.
#[derive(Clone, Debug)]
pub struct ResourceClient {
    requester: AuthenticatedRequester,
    endpoints: Endpoints,
    workspace_id: String,
}

impl ResourceClient {
    pub fn new(
        requester: AuthenticatedRequester,
        endpoints: Endpoints,
        workspace_id: String,
    ) -> Self {
        Self {
            requester,
            endpoints,
            workspace_id,
        }
    }

    /// One page of workspace contents, envelope included.
    pub async fn list_page(&self, limit: u64, offset: u64) -> Result<ContentsPage> {
        let mut url = self.endpoints.api(&["workspaces", self.workspace_id.as_str(), "contents"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        let page: ContentsPage = self
            .requester
            .request(Method::GET, url.as_str(), RequestBody::Empty)
            .await?
            .json()?;
        tracing::debug!(
            "Listed {} of {} items at offset {}",
            page.items.len(),
            page.count,
            page.offset
        );
        Ok(page)
    }

    /// Items of one page of workspace contents. Callers page by offset.
    pub async fn list(&self, limit: u64, offset: u64) -> Result<Vec<ContentItem>> {
        Ok(self.list_page(limit, offset).await?.items)
    }

    /// Metadata of one asset.
    pub async fn detail(&self, asset_id: &str) -> Result<AssetDetails> {
        let url = self.endpoints.api(&["assets", asset_id])?;
        self.requester
            .request(Method::GET, url.as_str(), RequestBody::Empty)
            .await?
            .json()
    }

    /// Delete an asset. The response body is ignored.
    pub async fn delete(&self, asset_id: &str) -> Result<()> {
        let url = self.endpoints.api(&["assets", asset_id])?;
        self.requester
            .request(Method::DELETE, url.as_str(), RequestBody::Empty)
            .await?;
        tracing::info!("Deleted asset {}", asset_id);
        Ok(())
    }

    /// Temporary download URL for an asset.
    pub async fn download(&self, asset_id: &str) -> Result<String> {
        let url = self.endpoints.api(&["assets", asset_id, "download"])?;
        let location: DownloadLocation = self
            .requester
            .request(Method::GET, url.as_str(), RequestBody::Empty)
            .await?
            .json()?;
        Ok(location.location)
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }
}
