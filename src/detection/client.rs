//! HTTP client for the emotion-detection service
//!
//! Posts the captured image payload as the raw request body and reads back
//! the detected faces. Only the first face is used.

use super::profile::EmotionProfile;
use crate::capture::CapturedImage;
use crate::config::DetectionConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::Duration;

/// Outcome of a successful detection call
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    /// The first detected face's emotion scores
    Face(EmotionProfile),
    /// The service answered but found no face
    NoFace,
}

/// Error types for detection submissions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Response body of the detection endpoint
#[derive(Debug, Deserialize)]
struct DetectionResponse {
    result: Vec<FaceRecord>,
}

/// One detected face
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaceRecord {
    face_attributes: FaceAttributes,
}

#[derive(Debug, Deserialize)]
struct FaceAttributes {
    emotion: EmotionProfile,
}

/// Interpret a detection response body
///
/// An empty `result` list means no face was found and is not an error.
pub fn parse_detection_response(body: &str) -> Result<Detection, SubmitError> {
    let response: DetectionResponse =
        serde_json::from_str(body).map_err(|e| SubmitError::ParseError(e.to_string()))?;

    let faces = response.result.len();
    match response.result.into_iter().next() {
        Some(face) => {
            if faces > 1 {
                tracing::debug!("Detection returned {} faces, using the first", faces);
            }
            Ok(Detection::Face(face.face_attributes.emotion))
        }
        None => Ok(Detection::NoFace),
    }
}

/// Remote emotion detection
#[async_trait]
pub trait EmotionDetector: Send + Sync {
    /// Submit an image and read back the first face's emotions
    async fn detect(&self, image: CapturedImage) -> Result<Detection, SubmitError>;
}

/// HTTP client for the detection endpoint
#[derive(Debug, Clone)]
pub struct DetectionClient {
    endpoint_url: String,
    content_type: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl DetectionClient {
    /// Create a client from configuration
    pub fn new(config: &DetectionConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create detection HTTP client")?;

        Ok(Self {
            endpoint_url: config.endpoint_url.clone(),
            content_type: config.content_type.clone(),
            client,
            timeout,
        })
    }

    /// The endpoint images are posted to
    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }
}

#[async_trait]
impl EmotionDetector for DetectionClient {
    async fn detect(&self, image: CapturedImage) -> Result<Detection, SubmitError> {
        tracing::debug!(
            "Posting image to detection service ({} bytes)",
            image.len()
        );

        let response = self
            .client
            .post(&self.endpoint_url)
            .header(CONTENT_TYPE, &self.content_type)
            .body(image.into_inner())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SubmitError::Timeout(self.timeout.as_secs())
                } else {
                    SubmitError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                SubmitError::Timeout(self.timeout.as_secs())
            } else {
                SubmitError::ConnectionFailed(e.to_string())
            }
        })?;

        if !status.is_success() {
            return Err(SubmitError::ServerError {
                status: status.as_u16(),
                message: body,
            });
        }

        parse_detection_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::EmotionLabel;

    #[test]
    fn test_empty_result_is_no_face() {
        let detection = parse_detection_response(r#"{"result": []}"#).unwrap();
        assert_eq!(detection, Detection::NoFace);
    }

    #[test]
    fn test_single_face_profile_is_verbatim() {
        let body = r#"{"result": [{"faceId": "f1", "faceAttributes": {"emotion": {
            "anger": 0.0, "contempt": 0.001, "disgust": 0.0, "fear": 0.0,
            "happiness": 0.9, "neutral": 0.098, "sadness": 0.0, "surprise": 0.3
        }}}]}"#;

        let Detection::Face(profile) = parse_detection_response(body).unwrap() else {
            panic!("expected a face");
        };

        assert_eq!(profile.len(), 8);
        assert_eq!(profile.score(EmotionLabel::Happiness), Some(0.9));
        assert_eq!(profile.score(EmotionLabel::Surprise), Some(0.3));
        assert_eq!(profile.score(EmotionLabel::Contempt), Some(0.001));
    }

    #[test]
    fn test_only_first_face_is_used() {
        let body = r#"{"result": [
            {"faceAttributes": {"emotion": {"sadness": 0.8}}},
            {"faceAttributes": {"emotion": {"happiness": 0.8}}}
        ]}"#;

        let detection = parse_detection_response(body).unwrap();
        assert_eq!(
            detection,
            Detection::Face(EmotionProfile::from_scores([("sadness", 0.8)]))
        );
    }

    #[test]
    fn test_scores_outside_unit_range_are_not_clamped() {
        let body = r#"{"result": [{"faceAttributes": {"emotion": {"anger": 1.5, "fear": -0.2}}}]}"#;
        let Detection::Face(profile) = parse_detection_response(body).unwrap() else {
            panic!("expected a face");
        };
        assert_eq!(profile.score(EmotionLabel::Anger), Some(1.5));
        assert_eq!(profile.score(EmotionLabel::Fear), Some(-0.2));
    }

    #[test]
    fn test_missing_result_is_parse_error() {
        let err = parse_detection_response(r#"{"error": "bad image"}"#).unwrap_err();
        assert!(matches!(err, SubmitError::ParseError(_)));
    }

    #[test]
    fn test_non_json_body_is_parse_error() {
        let err = parse_detection_response("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, SubmitError::ParseError(_)));
    }

    #[test]
    fn test_face_without_emotion_is_parse_error() {
        let err =
            parse_detection_response(r#"{"result": [{"faceAttributes": {"age": 30}}]}"#).unwrap_err();
        assert!(matches!(err, SubmitError::ParseError(_)));
    }

    #[test]
    fn test_client_uses_configured_endpoint() {
        let config = DetectionConfig {
            endpoint_url: "http://127.0.0.1:7071/api/detect".to_string(),
            ..DetectionConfig::default()
        };
        let client = DetectionClient::new(&config).unwrap();
        assert_eq!(client.endpoint_url(), "http://127.0.0.1:7071/api/detect");
        assert_eq!(client.content_type, crate::config::DEFAULT_IMAGE_CONTENT_TYPE);
    }

    #[test]
    fn test_error_display() {
        let err = SubmitError::ServerError {
            status: 500,
            message: "Internal error".to_string(),
        };
        assert_eq!(err.to_string(), "Server error (500): Internal error");
        assert_eq!(
            SubmitError::ConnectionFailed("refused".to_string()).to_string(),
            "Connection failed: refused"
        );
    }
}
