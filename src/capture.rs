//! Image capture
//!
//! The camera widget is an external capability: it hands us a finished,
//! string-encoded image through [`CaptureController::on_capture`]. The
//! controller is a cheap cloneable handle onto the workflow's state machine,
//! so the pending image lives in exactly one place.

use crate::workflow::state::{TransitionResult, WorkflowEvent, WorkflowStateMachine};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// An encoded image payload (typically a base64 data URI)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapturedImage(String);

impl CapturedImage {
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Media type of a `data:` URI payload, e.g. `image/jpeg`
    pub fn media_type(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("data:")?;
        let header = rest.split(',').next()?;
        let media_type = header.split(';').next()?;
        (!media_type.is_empty()).then_some(media_type)
    }
}

// Payloads are large; keep them out of logs.
impl std::fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedImage")
            .field("media_type", &self.media_type())
            .field("len", &self.len())
            .finish()
    }
}

impl From<String> for CapturedImage {
    fn from(payload: String) -> Self {
        Self(payload)
    }
}

impl From<&str> for CapturedImage {
    fn from(payload: &str) -> Self {
        Self(payload.to_string())
    }
}

/// Handle given to the capture capability
#[derive(Clone)]
pub struct CaptureController {
    machine: Arc<Mutex<WorkflowStateMachine>>,
}

impl CaptureController {
    pub(crate) fn new(machine: Arc<Mutex<WorkflowStateMachine>>) -> Self {
        Self { machine }
    }

    /// The camera was opened
    pub fn begin_capture(&self) -> Option<TransitionResult> {
        self.machine.lock().process_event(WorkflowEvent::BeginCapture)
    }

    /// Capture callback: store `payload` and signal readiness
    ///
    /// A second capture before submission replaces the first. Empty payloads
    /// and captures outside the pre-submit states are ignored.
    pub fn on_capture(&self, payload: impl Into<String>) -> Option<TransitionResult> {
        let image = CapturedImage::new(payload);
        if image.is_empty() {
            tracing::warn!("Ignoring empty capture payload");
            return None;
        }

        self.machine
            .lock()
            .process_event(WorkflowEvent::ImageCaptured(image))
    }

    /// Discard the stored image and go back to the pre-capture state
    pub fn retake(&self) -> Option<TransitionResult> {
        self.machine.lock().process_event(WorkflowEvent::Retake)
    }

    /// The image waiting to be submitted, if any
    pub fn pending_image(&self) -> Option<CapturedImage> {
        self.machine.lock().state().pending_image().cloned()
    }

    /// Whether an image is ready to submit
    pub fn is_ready(&self) -> bool {
        self.machine.lock().state().can_submit()
    }
}
