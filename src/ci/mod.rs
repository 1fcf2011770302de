use reqwest::Url;
use std::num::NonZeroU64;
use std::time::Duration;

use crate::error::{CiError, Result};

pub mod admin;
pub mod audit;
pub mod auth;
pub mod client;
pub mod requester;
pub mod types;
pub mod upload;

pub use admin::SonyCiAdmin;
pub use audit::LogEntry;
pub use auth::{Credentials, Token, TokenManager, TokenStatus};
pub use client::ResourceClient;
pub use requester::{AuthenticatedRequester, RequestBody, ResponseBody};
pub use types::{AssetDetails, ContentItem, ContentsPage};
pub use upload::{chunk_plan, ChunkSpec, UploadSession, UploadStrategy, Uploader};

/// Host for metadata and control operations.
pub const API_BASE_URL: &str = "https://api.cimediacloud.com";

/// Host that receives upload bodies.
pub const IO_BASE_URL: &str = "https://io.cimediacloud.com";

/// Largest file sent in one request, and the size of every multipart chunk.
pub const DEFAULT_CHUNK_SIZE: u64 = 10 * 1024 * 1024;

/// Base URLs of the two Ci hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_base: String,
    pub io_base: String,
}

impl Endpoints {
    /// Point both hosts at the same base URL, e.g. a local mock server.
    pub fn single(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            api_base: base.clone(),
            io_base: base,
        }
    }

    /// URL on the API host. Each segment is percent-encoded on its own, so
    /// ids can never add path components or a query string.
    pub(crate) fn api(&self, segments: &[&str]) -> Result<Url> {
        join_segments(&self.api_base, segments)
    }

    /// URL on the upload host, encoded like [`Endpoints::api`].
    pub(crate) fn io(&self, segments: &[&str]) -> Result<Url> {
        join_segments(&self.io_base, segments)
    }
}

fn join_segments(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| CiError::BadRequest(format!("invalid base URL {}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| CiError::BadRequest(format!("base URL {} cannot take a path", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: API_BASE_URL.to_string(),
            io_base: IO_BASE_URL.to_string(),
        }
    }
}

/// Tunables for a [`SonyCiAdmin`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub endpoints: Endpoints,
    pub chunk_size: NonZeroU64,
    /// Per-request timeout. `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            chunk_size: NonZeroU64::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroU64::MIN),
            timeout: None,
        }
    }
}
