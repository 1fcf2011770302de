//! Error types for the Sony Ci client.

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum CiError {
    /// Token endpoint rejected the password grant or returned garbage.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Non-2xx response from any endpoint other than the token endpoint.
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    /// HTTP client error
    #[error("HTTP request failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A 2xx response whose body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// The remote upload finished but the details fetch or log append did not.
    #[error("Asset {asset_id} was uploaded but could not be logged: {source}")]
    Audit {
        asset_id: String,
        #[source]
        source: Box<CiError>,
    },
}

impl CiError {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            CiError::Http { status, .. } => Some(*status),
            CiError::HttpClient(e) => e.status().map(|s| s.as_u16()),
            CiError::Audit { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Id of an asset that exists remotely despite this error.
    pub fn uploaded_asset_id(&self) -> Option<&str> {
        match self {
            CiError::Audit { asset_id, .. } => Some(asset_id),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display_and_status() {
        let err = CiError::Http {
            status: 400,
            url: "https://api.cimediacloud.com/assets/bad-id/download".to_string(),
            body: String::new(),
        };
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().starts_with("HTTP 400 from"));
        assert!(err.uploaded_asset_id().is_none());
    }

    #[test]
    fn test_audit_error_keeps_asset_id() {
        let err = CiError::Audit {
            asset_id: "asset-id".to_string(),
            source: Box::new(CiError::Http {
                status: 503,
                url: "https://api.cimediacloud.com/assets/asset-id".to_string(),
                body: "unavailable".to_string(),
            }),
        };
        assert_eq!(err.uploaded_asset_id(), Some("asset-id"));
        assert_eq!(err.status(), Some(503));
    }
}
