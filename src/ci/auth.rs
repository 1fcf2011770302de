//! Token management for Ci API authentication.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::types::TokenResponse;
use crate::error::{CiError, Result};

/// Tokens are treated as expired this long before the service says so.
const EXPIRY_LEEWAY_SECS: i64 = 30;

/// Upper bound on a lifetime the service can hand us (ten years).
const MAX_EXPIRES_IN_SECS: u64 = 10 * 365 * 24 * 3600;

/// Account credentials handed to the client by its caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
    pub workspace_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("workspace_id", &self.workspace_id)
            .finish()
    }
}

/// Bearer token with the moment it was obtained.
#[derive(Clone)]
pub struct Token {
    pub access_token: String,
    pub expires_in: u64,
    pub token_type: String,
    pub obtained_at: DateTime<Utc>,
}

impl Token {
    fn from_response(response: TokenResponse, obtained_at: DateTime<Utc>) -> Self {
        Self {
            access_token: response.access_token,
            expires_in: response.expires_in,
            token_type: response.token_type,
            obtained_at,
        }
    }

    /// When the service stops accepting this token.
    pub fn expires_at(&self) -> DateTime<Utc> {
        let secs = self.expires_in.min(MAX_EXPIRES_IN_SECS) as i64;
        self.obtained_at + Duration::seconds(secs)
    }

    /// Check if the token is expired or about to expire at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_LEEWAY_SECS) >= self.expires_at()
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Where the token cache currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Unauthenticated,
    Valid { expires_at: DateTime<Utc> },
    Expired,
}

/// Acquires and caches the bearer token via the OAuth password grant.
///
/// The cache lock is held across the token exchange, so concurrent callers
/// wait for one authentication instead of racing their own.
#[derive(Clone)]
pub struct TokenManager {
    credentials: Arc<Credentials>,
    token_url: String,
    http_client: Client,
    token: Arc<Mutex<Option<Token>>>,
}

impl TokenManager {
    /// Create a new token manager.
    pub fn new(credentials: Arc<Credentials>, token_url: String, http_client: Client) -> Self {
        Self {
            credentials,
            token_url,
            http_client,
            token: Arc::new(Mutex::new(None)),
        }
    }

    /// Get a valid access token, authenticating first if none is cached or
    /// the cached one has expired.
    pub async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;

        if let Some(ref token) = *guard {
            if !token.is_expired_at(Utc::now()) {
                return Ok(token.access_token.clone());
            }
            tracing::debug!("Cached access token expired at {}", token.expires_at());
        }

        let token = self.authenticate().await?;
        let access_token = token.access_token.clone();
        *guard = Some(token);
        Ok(access_token)
    }

    /// Current state of the token cache.
    pub async fn status(&self) -> TokenStatus {
        match *self.token.lock().await {
            None => TokenStatus::Unauthenticated,
            Some(ref token) if token.is_expired_at(Utc::now()) => TokenStatus::Expired,
            Some(ref token) => TokenStatus::Valid {
                expires_at: token.expires_at(),
            },
        }
    }

    /// Drop the cached token; the next request redoes the password grant.
    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    /// Exchange the credentials for a fresh token. No retry.
    async fn authenticate(&self) -> Result<Token> {
        tracing::info!("Authenticating as {}", self.credentials.username);

        let params = [
            ("grant_type", "password"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!("Token endpoint returned {}", status);
            return Err(CiError::Auth(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                text
            )));
        }

        let data: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| CiError::Auth(format!("unparsable token response: {}", e)))?;

        let token = Token::from_response(data, Utc::now());

        tracing::info!(
            "Successfully obtained access token, expires at {}",
            token.expires_at()
        );

        Ok(token)
    }

    /// Get the HTTP client.
    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    /// Credentials this manager authenticates with.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("credentials", &self.credentials)
            .field("token_url", &self.token_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expires_in: u64, obtained_at: DateTime<Utc>) -> Token {
        Token {
            access_token: "secret-token".to_string(),
            expires_in,
            token_type: "bearer".to_string(),
            obtained_at,
        }
    }

    #[test]
    fn test_token_valid_within_window() {
        let now = Utc::now();
        let t = token(3600, now);
        assert_eq!(t.expires_at(), now + Duration::seconds(3600));
        assert!(!t.is_expired_at(now));
        assert!(!t.is_expired_at(now + Duration::seconds(3000)));
    }

    #[test]
    fn test_token_expires_with_leeway() {
        let now = Utc::now();
        let t = token(3600, now);
        assert!(t.is_expired_at(now + Duration::seconds(3600 - EXPIRY_LEEWAY_SECS)));
        assert!(t.is_expired_at(now + Duration::seconds(7200)));
        assert!(token(0, now).is_expired_at(now));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credentials = Credentials {
            username: "user@example.com".to_string(),
            password: "hunter2".to_string(),
            client_id: "cid".to_string(),
            client_secret: "csecret".to_string(),
            workspace_id: "ws".to_string(),
        };
        let rendered = format!("{:?}", credentials);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("csecret"));
        assert!(rendered.contains("user@example.com"));

        let rendered = format!("{:?}", token(10, Utc::now()));
        assert!(!rendered.contains("secret-token"));
    }

    #[tokio::test]
    async fn test_fresh_manager_is_unauthenticated() {
        let credentials = Arc::new(Credentials {
            username: "u".to_string(),
            password: "p".to_string(),
            client_id: "c".to_string(),
            client_secret: "s".to_string(),
            workspace_id: "w".to_string(),
        });
        let manager = TokenManager::new(
            credentials,
            "http://127.0.0.1:1/oauth2/token".to_string(),
            Client::new(),
        );
        assert_eq!(manager.status().await, TokenStatus::Unauthenticated);
        manager.invalidate().await;
        assert_eq!(manager.status().await, TokenStatus::Unauthenticated);
    }
}
