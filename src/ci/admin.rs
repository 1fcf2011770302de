//! Entry point composing authentication, uploads and asset operations.

use reqwest::Client;
use std::path::Path;
use std::sync::Arc;

use super::auth::{Credentials, TokenManager, TokenStatus};
use super::client::ResourceClient;
use super::requester::AuthenticatedRequester;
use super::types::{AssetDetails, ContentItem, ContentsPage};
use super::upload::Uploader;
use super::ClientOptions;
use crate::error::Result;

/// Client for one Ci workspace.
///
/// Cloning is cheap and clones share the cached token.
#[derive(Clone)]
pub struct SonyCiAdmin {
    token_manager: TokenManager,
    uploader: Uploader,
    resources: ResourceClient,
}

impl SonyCiAdmin {
    /// Client against the production hosts with default options.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_options(credentials, ClientOptions::default())
    }

    pub fn with_options(credentials: Credentials, options: ClientOptions) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let workspace_id = credentials.workspace_id.clone();
        let token_manager = TokenManager::new(
            Arc::new(credentials),
            options.endpoints.api(&["oauth2", "token"])?.to_string(),
            http_client,
        );
        let requester = AuthenticatedRequester::new(token_manager.clone());
        let resources =
            ResourceClient::new(requester.clone(), options.endpoints.clone(), workspace_id);
        let uploader = Uploader::new(
            requester,
            resources.clone(),
            options.endpoints,
            options.chunk_size,
        );

        Ok(Self {
            token_manager,
            uploader,
            resources,
        })
    }

    /// Current bearer token, authenticating if needed.
    pub async fn access_token(&self) -> Result<String> {
        self.token_manager.access_token().await
    }

    pub async fn token_status(&self) -> TokenStatus {
        self.token_manager.status().await
    }

    /// Upload a file and log it to `log_path`. Returns the new asset id.
    pub async fn upload(
        &self,
        path: impl AsRef<Path>,
        log_path: impl AsRef<Path>,
    ) -> Result<String> {
        self.uploader.upload(path.as_ref(), log_path.as_ref()).await
    }

    pub async fn list(&self, limit: u64, offset: u64) -> Result<Vec<ContentItem>> {
        self.resources.list(limit, offset).await
    }

    pub async fn list_page(&self, limit: u64, offset: u64) -> Result<ContentsPage> {
        self.resources.list_page(limit, offset).await
    }

    pub async fn detail(&self, asset_id: &str) -> Result<AssetDetails> {
        self.resources.detail(asset_id).await
    }

    pub async fn delete(&self, asset_id: &str) -> Result<()> {
        self.resources.delete(asset_id).await
    }

    pub async fn download(&self, asset_id: &str) -> Result<String> {
        self.resources.download(asset_id).await
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.token_manager
    }

    pub fn uploader(&self) -> &Uploader {
        &self.uploader
    }

    pub fn resources(&self) -> &ResourceClient {
        &self.resources
    }
}

impl std::fmt::Debug for SonyCiAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SonyCiAdmin")
            .field("token_manager", &self.token_manager)
            .field("workspace_id", &self.resources.workspace_id())
            .field("chunk_size", &self.uploader.chunk_size())
            .finish()
    }
}
