//! Streaming-service identity lookup
//!
//! A single bearer-authorised GET against the identity endpoint. Failures are
//! reported to the caller and never retried.

use crate::config::IdentityConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The authenticated user as reported by the identity endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Display name (the service returns `null` for users without one)
    #[serde(default)]
    pub display_name: Option<String>,
    /// Stable user id
    pub id: String,
}

/// Error types for identity lookups
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("No access token available")]
    MissingToken,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Source of the authenticated user's identity
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fetch the identity of the user owning `token`
    async fn fetch_identity(&self, token: &str) -> Result<Identity, IdentityError>;
}

/// HTTP client for the identity endpoint
#[derive(Debug, Clone)]
pub struct IdentityClient {
    api_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl IdentityClient {
    /// Create a client from configuration
    pub fn new(config: &IdentityConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create identity HTTP client")?;

        Ok(Self {
            api_url: config.api_url.clone(),
            client,
            timeout,
        })
    }

    /// The endpoint this client queries
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl IdentityProvider for IdentityClient {
    async fn fetch_identity(&self, token: &str) -> Result<Identity, IdentityError> {
        if token.is_empty() {
            return Err(IdentityError::MissingToken);
        }

        tracing::debug!("Fetching identity from {}", self.api_url);

        let response = self
            .client
            .get(&self.api_url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IdentityError::Timeout(self.timeout.as_secs())
                } else {
                    IdentityError::ConnectionFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(IdentityError::ServerError { status, message });
        }

        response
            .json::<Identity>()
            .await
            .map_err(|e| IdentityError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_deserialises_service_shape() {
        let identity: Identity = serde_json::from_str(
            r#"{"display_name": "Nat", "id": "user-1", "country": "US", "followers": {"total": 3}}"#,
        )
        .expect("identity should parse");
        assert_eq!(identity.display_name.as_deref(), Some("Nat"));
        assert_eq!(identity.id, "user-1");
    }

    #[test]
    fn test_identity_null_display_name() {
        let identity: Identity =
            serde_json::from_str(r#"{"display_name": null, "id": "user-2"}"#).unwrap();
        assert!(identity.display_name.is_none());
    }

    #[test]
    fn test_identity_requires_id() {
        assert!(serde_json::from_str::<Identity>(r#"{"display_name": "x"}"#).is_err());
    }

    #[test]
    fn test_client_uses_configured_url() {
        let config = IdentityConfig {
            api_url: "http://localhost:9000/me".to_string(),
            timeout_secs: 3,
        };
        let client = IdentityClient::new(&config).unwrap();
        assert_eq!(client.api_url(), "http://localhost:9000/me");
        assert_eq!(client.timeout.as_secs(), 3);
    }

    #[tokio::test]
    async fn test_empty_token_is_rejected_without_request() {
        let client = IdentityClient::new(&IdentityConfig::default()).unwrap();
        let result = client.fetch_identity("").await;
        assert!(matches!(result, Err(IdentityError::MissingToken)));
    }

    #[test]
    fn test_error_display() {
        let err = IdentityError::ServerError {
            status: 401,
            message: "expired".to_string(),
        };
        assert_eq!(err.to_string(), "Server error (401): expired");
        assert_eq!(
            IdentityError::Timeout(10).to_string(),
            "Request timeout after 10 seconds"
        );
    }
}
