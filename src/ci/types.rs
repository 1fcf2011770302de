//! Sony Ci API request and response types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Authentication
// ============================================================================

/// Response body of the password grant.
#[derive(Debug, Deserialize, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: String,
    /// Accepted but never used; re-authentication always redoes the password grant.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

// ============================================================================
// Uploads
// ============================================================================

/// `metadata` field of a single-shot upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata<'a> {
    pub workspace_id: &'a str,
}

/// Request body for opening a multipart upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipartCreateRequest<'a> {
    pub name: &'a str,
    pub size: u64,
    pub workspace_id: &'a str,
}

/// Response of both upload endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIdResponse {
    pub asset_id: String,
}

// ============================================================================
// Assets and workspaces
// ============================================================================

/// One entry of a workspace listing, passed through untouched.
pub type ContentItem = Map<String, Value>;

/// Envelope of `GET /workspaces/{id}/contents`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ContentsPage {
    pub limit: u64,
    pub offset: u64,
    pub count: u64,
    #[serde(default)]
    pub items: Vec<ContentItem>,
}

/// Snapshot of an asset's remote metadata.
///
/// `id` and `name` are lifted out; every other field lands in `extra` in the
/// order the service sent it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AssetDetails {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `GET /assets/{id}/download`.
#[derive(Debug, Deserialize)]
pub struct DownloadLocation {
    pub location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_create_serializes_in_wire_order() {
        let body = MultipartCreateRequest {
            name: "large-file.txt",
            size: 42,
            workspace_id: "ws",
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"name":"large-file.txt","size":42,"workspaceId":"ws"}"#
        );
    }

    #[test]
    fn test_asset_details_keeps_extra_fields() {
        let details: AssetDetails = serde_json::from_str(
            r#"{"id":"asset-id","name":"video.mp3","size":10,"kind":"asset"}"#,
        )
        .unwrap();
        assert_eq!(details.id, "asset-id");
        assert_eq!(details.name.as_deref(), Some("video.mp3"));
        assert_eq!(details.extra.len(), 2);
        assert_eq!(
            serde_json::to_string(&details).unwrap(),
            r#"{"id":"asset-id","name":"video.mp3","size":10,"kind":"asset"}"#
        );
    }

    #[test]
    fn test_token_response_without_refresh_token() {
        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":3600}"#).unwrap();
        assert_eq!(token.access_token, "abc");
        assert!(token.refresh_token.is_none());
    }
}
