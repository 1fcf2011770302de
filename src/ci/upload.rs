//! Single-shot and multipart chunked uploads.
//!
//! Files up to the chunk size go up in one `POST /upload`. Larger files open a
//! multipart session, send each chunk with its own `PUT` strictly in file
//! order, then close the session. The first failed chunk aborts the upload;
//! the remote session is left incomplete and nothing is retried.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use std::io::SeekFrom;
use std::num::NonZeroU64;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::audit::LogEntry;
use super::client::ResourceClient;
use super::requester::{AuthenticatedRequester, RequestBody};
use super::types::{AssetIdResponse, MultipartCreateRequest, UploadMetadata};
use super::Endpoints;
use crate::error::{CiError, Result};

/// How a file of a given size is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStrategy {
    SingleShot,
    Chunked,
}

impl UploadStrategy {
    pub fn for_size(size: u64, chunk_size: NonZeroU64) -> Self {
        if size <= chunk_size.get() {
            UploadStrategy::SingleShot
        } else {
            UploadStrategy::Chunked
        }
    }
}

/// One chunk of a multipart upload. `index` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpec {
    pub index: u64,
    pub start: u64,
    pub len: u64,
}

impl ChunkSpec {
    pub fn end(&self) -> u64 {
        self.start + self.len
    }
}

/// Split `size` bytes into contiguous chunks of `chunk_size`, the last one
/// possibly shorter. Never yields an empty chunk.
pub fn chunk_plan(size: u64, chunk_size: NonZeroU64) -> Vec<ChunkSpec> {
    let chunk_size = chunk_size.get();
    let count = size.div_ceil(chunk_size);
    (0..count)
        .map(|i| {
            let start = i * chunk_size;
            ChunkSpec {
                index: i + 1,
                start,
                len: chunk_size.min(size - start),
            }
        })
        .collect()
}

/// State of one in-flight multipart upload. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub asset_id: String,
    pub total_size: u64,
    pub chunk_size: u64,
    pub chunk_count: u64,
}

/// Drives uploads and records each success in the upload log.
#[derive(Clone, Debug)]
pub struct Uploader {
    requester: AuthenticatedRequester,
    resources: ResourceClient,
    endpoints: Endpoints,
    chunk_size: NonZeroU64,
}

impl Uploader {
    pub fn new(
        requester: AuthenticatedRequester,
        resources: ResourceClient,
        endpoints: Endpoints,
        chunk_size: NonZeroU64,
    ) -> Self {
        Self {
            requester,
            resources,
            endpoints,
            chunk_size,
        }
    }

    pub fn chunk_size(&self) -> NonZeroU64 {
        self.chunk_size
    }

    /// Upload `path` and append a line to `log_path`. Returns the asset id.
    ///
    /// If the upload succeeds but the details fetch or the log append fails,
    /// the error is [`CiError::Audit`] and still carries the asset id.
    pub async fn upload(&self, path: &Path, log_path: &Path) -> Result<String> {
        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                CiError::BadRequest(format!("{} has no file name", path.display()))
            })?;
        let size = tokio::fs::metadata(path).await?.len();

        let strategy = UploadStrategy::for_size(size, self.chunk_size);
        tracing::info!("Uploading '{}' ({} bytes, {:?})", basename, size, strategy);

        let asset_id = match strategy {
            UploadStrategy::SingleShot => self.upload_single(path, &basename).await?,
            UploadStrategy::Chunked => self.upload_chunked(path, &basename, size).await?,
        };

        tracing::info!("Uploaded '{}' as asset {}", basename, asset_id);

        if let Err(e) = self.record(&basename, &asset_id, log_path).await {
            tracing::error!("Failed to log upload of asset {}: {}", asset_id, e);
            return Err(CiError::Audit {
                asset_id,
                source: Box::new(e),
            });
        }

        Ok(asset_id)
    }

    async fn upload_single(&self, path: &Path, basename: &str) -> Result<String> {
        let data = tokio::fs::read(path).await?;
        let metadata = serde_json::to_string(&UploadMetadata {
            workspace_id: self.resources.workspace_id(),
        })?;

        let form = Form::new()
            .part("filename", Part::bytes(data).file_name(basename.to_string()))
            .text("metadata", metadata);

        let url = self.endpoints.io(&["upload"])?;
        let response: AssetIdResponse = self
            .requester
            .request(Method::POST, url.as_str(), RequestBody::Multipart(form))
            .await?
            .json()?;

        Ok(response.asset_id)
    }

    async fn upload_chunked(&self, path: &Path, basename: &str, size: u64) -> Result<String> {
        let session = self.create_session(basename, size).await?;
        tracing::debug!(
            "Opened multipart session for asset {}: {} chunks of {} bytes",
            session.asset_id,
            session.chunk_count,
            session.chunk_size
        );

        let mut file = tokio::fs::File::open(path).await?;

        for chunk in chunk_plan(size, self.chunk_size) {
            let mut buf = vec![0u8; chunk.len as usize];
            file.seek(SeekFrom::Start(chunk.start)).await?;
            file.read_exact(&mut buf).await?;

            let index = chunk.index.to_string();
            let url = self.endpoints.io(&[
                "upload",
                "multipart",
                session.asset_id.as_str(),
                index.as_str(),
            ])?;
            let body = RequestBody::Bytes(Bytes::from(buf));

            if let Err(e) = self
                .requester
                .request(Method::PUT, url.as_str(), body)
                .await
            {
                tracing::error!(
                    "Chunk {}/{} of asset {} failed, abandoning upload: {}",
                    chunk.index,
                    session.chunk_count,
                    session.asset_id,
                    e
                );
                return Err(e);
            }

            tracing::debug!(
                "Sent chunk {}/{} (bytes {}..{})",
                chunk.index,
                session.chunk_count,
                chunk.start,
                chunk.end()
            );
        }

        let url = self
            .endpoints
            .io(&["upload", "multipart", session.asset_id.as_str(), "complete"])?;
        self.requester
            .request(Method::POST, url.as_str(), RequestBody::Empty)
            .await?;

        Ok(session.asset_id)
    }

    async fn create_session(&self, basename: &str, size: u64) -> Result<UploadSession> {
        let body = serde_json::to_value(MultipartCreateRequest {
            name: basename,
            size,
            workspace_id: self.resources.workspace_id(),
        })?;

        let url = self.endpoints.io(&["upload", "multipart"])?;
        let response: AssetIdResponse = self
            .requester
            .request(Method::POST, url.as_str(), RequestBody::Json(body))
            .await?
            .json()?;

        Ok(UploadSession {
            asset_id: response.asset_id,
            total_size: size,
            chunk_size: self.chunk_size.get(),
            chunk_count: size.div_ceil(self.chunk_size.get()),
        })
    }

    async fn record(&self, basename: &str, asset_id: &str, log_path: &Path) -> Result<()> {
        let details = self.resources.detail(asset_id).await?;
        LogEntry::new(basename, asset_id, details)
            .append_to(log_path)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nz(n: u64) -> NonZeroU64 {
        NonZeroU64::new(n).unwrap()
    }

    #[test]
    fn test_strategy_threshold() {
        assert_eq!(UploadStrategy::for_size(0, nz(10)), UploadStrategy::SingleShot);
        assert_eq!(UploadStrategy::for_size(10, nz(10)), UploadStrategy::SingleShot);
        assert_eq!(UploadStrategy::for_size(11, nz(10)), UploadStrategy::Chunked);
    }

    #[test]
    fn test_plan_exact_multiple_has_no_trailing_chunk() {
        let plan = chunk_plan(20, nz(10));
        assert_eq!(
            plan,
            vec![
                ChunkSpec { index: 1, start: 0, len: 10 },
                ChunkSpec { index: 2, start: 10, len: 10 },
            ]
        );
    }

    #[test]
    fn test_plan_one_byte_over() {
        let plan = chunk_plan(11, nz(10));
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].len, 10);
        assert_eq!(plan[1], ChunkSpec { index: 2, start: 10, len: 1 });
    }

    #[test]
    fn test_plan_is_contiguous_and_covers_file() {
        let size = 1_000_003;
        let plan = chunk_plan(size, nz(4096));
        assert_eq!(plan.first().map(|c| c.start), Some(0));
        for pair in plan.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start);
            assert_eq!(pair[0].index + 1, pair[1].index);
        }
        assert_eq!(plan.last().map(|c| c.end()), Some(size));
        assert!(plan.iter().all(|c| c.len > 0 && c.len <= 4096));
    }

    #[test]
    fn test_plan_empty_file() {
        assert!(chunk_plan(0, nz(10)).is_empty());
    }
}
