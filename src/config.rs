//! Configuration for moodtune
//!
//! Holds the remote endpoints and request timeouts used by the detection and
//! identity clients. Configuration is read from JSON supplied by the host page
//! (or a file during development); every field has a default so partial
//! documents are accepted. Nothing is ever written back.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

/// Default emotion-detection endpoint
pub const DEFAULT_DETECTION_URL: &str = "https://songrecapp.azurewebsites.net/api/SongRecTrigger";

/// Default identity endpoint of the streaming service
pub const DEFAULT_IDENTITY_URL: &str = "https://api.spotify.com/v1/me";

/// Content type a browser attaches to a plain string request body
pub const DEFAULT_IMAGE_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Emotion-detection service settings
    pub detection: DetectionConfig,
    /// Streaming-service identity settings
    pub identity: IdentityConfig,
}

/// Emotion-detection service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// URL the captured image is POSTed to
    pub endpoint_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Content-Type header sent with the image payload
    pub content_type: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_DETECTION_URL.to_string(),
            timeout_secs: 30,
            content_type: DEFAULT_IMAGE_CONTENT_TYPE.to_string(),
        }
    }
}

/// Identity API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// URL returning the authenticated user's profile
    pub api_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_IDENTITY_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl Config {
    /// Parse configuration from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(json).context("Failed to parse configuration JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    ///
    /// A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::info!("Config file {} not found, using defaults", path.display());
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = Self::from_json(&contents)?;
        tracing::info!(
            "Config loaded: detection={}, identity={}",
            config.detection.endpoint_url,
            config.identity.api_url
        );
        Ok(config)
    }

    /// Check that endpoints are absolute URLs and timeouts are non-zero
    pub fn validate(&self) -> Result<()> {
        validate_url("detection.endpoint_url", &self.detection.endpoint_url)?;
        validate_url("identity.api_url", &self.identity.api_url)?;

        if self.detection.timeout_secs == 0 {
            return Err(anyhow!("detection.timeout_secs must be greater than zero"));
        }
        if self.identity.timeout_secs == 0 {
            return Err(anyhow!("identity.timeout_secs must be greater than zero"));
        }
        if self.detection.content_type.trim().is_empty() {
            return Err(anyhow!("detection.content_type must not be empty"));
        }

        Ok(())
    }
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    let parsed = Url::parse(value).map_err(|e| anyhow!("Invalid {}: {}", field, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(anyhow!("Invalid {}: unsupported scheme '{}'", field, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detection.endpoint_url, DEFAULT_DETECTION_URL);
        assert_eq!(config.identity.api_url, DEFAULT_IDENTITY_URL);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json(r#"{"detection": {"timeout_secs": 5}}"#)
            .expect("partial config should parse");
        assert_eq!(config.detection.timeout_secs, 5);
        assert_eq!(config.detection.endpoint_url, DEFAULT_DETECTION_URL);
        assert_eq!(config.identity, IdentityConfig::default());
    }

    #[test]
    fn test_empty_object_is_default() {
        let config = Config::from_json("{}").expect("empty object should parse");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_rejects_relative_url() {
        let result = Config::from_json(r#"{"identity": {"api_url": "/v1/me"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let result = Config::from_json(r#"{"detection": {"endpoint_url": "ftp://host/x"}}"#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unsupported scheme"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = Config::from_json(r#"{"identity": {"timeout_secs": 0}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(Config::from_json("{not json").is_err());
    }
}
