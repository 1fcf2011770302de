//! Bearer-authenticated requests and response classification.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, EXPECT};
use reqwest::multipart::Form;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::auth::TokenManager;
use crate::error::{CiError, Result};

/// Body of an outgoing request.
#[derive(Debug)]
pub enum RequestBody {
    Empty,
    /// Serialized as `application/json`.
    Json(Value),
    /// URL-form-encoded fields.
    Form(Vec<(String, String)>),
    /// `multipart/form-data`.
    Multipart(Form),
    /// Raw chunk bytes, sent as `application/octet-stream` with an empty
    /// `Expect` header so the body goes out without a 100-continue round trip.
    Bytes(Bytes),
}

/// Body of a 2xx response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Raw(String),
    Empty,
}

impl ResponseBody {
    /// Classify a response body: JSON when it parses, raw text otherwise.
    pub fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            return ResponseBody::Empty;
        }
        match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Raw(text),
        }
    }

    /// Deserialize a JSON body into `T`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            ResponseBody::Json(value) => serde_json::from_value(value)
                .map_err(|e| CiError::UnexpectedResponse(e.to_string())),
            ResponseBody::Raw(text) => Err(CiError::UnexpectedResponse(format!(
                "expected JSON, got: {}",
                text
            ))),
            ResponseBody::Empty => Err(CiError::UnexpectedResponse(
                "expected JSON, got an empty body".to_string(),
            )),
        }
    }
}

/// Wraps every request with `Authorization: Bearer <token>`.
///
/// Non-2xx responses become [`CiError::Http`]. Nothing is retried here.
#[derive(Clone, Debug)]
pub struct AuthenticatedRequester {
    token_manager: TokenManager,
}

impl AuthenticatedRequester {
    pub fn new(token_manager: TokenManager) -> Self {
        Self { token_manager }
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.token_manager
    }

    /// Send an authenticated request.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: RequestBody,
    ) -> Result<ResponseBody> {
        self.request_with_headers(method, url, body, HeaderMap::new()).await
    }

    /// Send an authenticated request with additional headers. Caller headers
    /// are applied last and win over the defaults.
    pub async fn request_with_headers(
        &self,
        method: Method,
        url: &str,
        body: RequestBody,
        headers: HeaderMap,
    ) -> Result<ResponseBody> {
        let token = self.token_manager.access_token().await?;

        tracing::debug!("{} {}", method, url);

        let mut builder = self
            .token_manager
            .http_client()
            .request(method.clone(), url)
            .bearer_auth(token);

        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(&value)?),
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Multipart(form) => builder.multipart(form),
            RequestBody::Bytes(bytes) => builder
                .header(CONTENT_TYPE, "application/octet-stream")
                .header(EXPECT, HeaderValue::from_static(""))
                .body(bytes),
        };

        let response = builder.headers(headers).send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!("{} {} failed with status {}", method, url, status);
            return Err(CiError::Http {
                status: status.as_u16(),
                url: url.to_string(),
                body: text,
            });
        }

        Ok(ResponseBody::from_text(text))
    }
}
