//! Emotion detection subsystem
//!
//! Submits a captured face image to the remote detection service and turns
//! the response into an [`EmotionProfile`].

pub mod client;
pub mod profile;

pub use client::{
    parse_detection_response, Detection, DetectionClient, EmotionDetector, SubmitError,
};
pub use profile::{EmotionLabel, EmotionProfile};
