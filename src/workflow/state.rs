//! Capture/submit workflow state machine
//!
//! One tagged state carries everything that is valid in it: the image while
//! waiting or submitting, the image and emotions once resolved, the cause of a
//! failure. Events that make no sense in the current state are rejected and
//! leave the state untouched.

use crate::capture::CapturedImage;
use crate::detection::{EmotionProfile, SubmitError};
use serde::{Deserialize, Serialize};

/// Workflow state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WorkflowState {
    /// Nothing captured yet
    #[default]
    Idle,
    /// Camera open, waiting for a frame
    Capturing,
    /// An image is waiting to be submitted
    ReadyToSubmit { image: CapturedImage },
    /// The image is with the detection service
    Submitting { image: CapturedImage },
    /// Emotions detected for the image
    Resolved {
        image: CapturedImage,
        emotions: EmotionProfile,
    },
    /// The service found no face
    EmptyResult,
    /// The submission failed
    Error { cause: SubmitError },
}

/// Variant of [`WorkflowState`] without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    Idle,
    Capturing,
    ReadyToSubmit,
    Submitting,
    Resolved,
    EmptyResult,
    Error,
}

impl WorkflowPhase {
    /// Returns a human-readable description of the phase
    pub fn description(&self) -> &'static str {
        match self {
            WorkflowPhase::Idle => "Waiting for a photo",
            WorkflowPhase::Capturing => "Camera ready",
            WorkflowPhase::ReadyToSubmit => "Photo ready to submit",
            WorkflowPhase::Submitting => "Reading your mood",
            WorkflowPhase::Resolved => "Mood detected",
            WorkflowPhase::EmptyResult => "No face detected",
            WorkflowPhase::Error => "Mood detection failed",
        }
    }
}

impl WorkflowState {
    pub fn phase(&self) -> WorkflowPhase {
        match self {
            WorkflowState::Idle => WorkflowPhase::Idle,
            WorkflowState::Capturing => WorkflowPhase::Capturing,
            WorkflowState::ReadyToSubmit { .. } => WorkflowPhase::ReadyToSubmit,
            WorkflowState::Submitting { .. } => WorkflowPhase::Submitting,
            WorkflowState::Resolved { .. } => WorkflowPhase::Resolved,
            WorkflowState::EmptyResult => WorkflowPhase::EmptyResult,
            WorkflowState::Error { .. } => WorkflowPhase::Error,
        }
    }

    /// Returns whether a submission is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, WorkflowState::Submitting { .. })
    }

    /// Returns whether a submit trigger would be accepted
    pub fn can_submit(&self) -> bool {
        matches!(self, WorkflowState::ReadyToSubmit { .. })
    }

    /// Returns whether a retake would be accepted
    pub fn can_retake(&self) -> bool {
        !matches!(self, WorkflowState::Idle | WorkflowState::Submitting { .. })
    }

    /// The image waiting to be submitted
    pub fn pending_image(&self) -> Option<&CapturedImage> {
        match self {
            WorkflowState::ReadyToSubmit { image } => Some(image),
            _ => None,
        }
    }

    /// The image held by this state, whatever its stage
    pub fn image(&self) -> Option<&CapturedImage> {
        match self {
            WorkflowState::ReadyToSubmit { image }
            | WorkflowState::Submitting { image }
            | WorkflowState::Resolved { image, .. } => Some(image),
            _ => None,
        }
    }

    /// Detected emotions, only present once resolved
    pub fn emotions(&self) -> Option<&EmotionProfile> {
        match self {
            WorkflowState::Resolved { emotions, .. } => Some(emotions),
            _ => None,
        }
    }
}

/// Events that can trigger state transitions
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// The camera was opened
    BeginCapture,
    /// The capture capability delivered an image
    ImageCaptured(CapturedImage),
    /// The user triggered submission
    Submit,
    /// Detection returned emotions for submission `submission`
    DetectionSucceeded {
        submission: u64,
        emotions: EmotionProfile,
    },
    /// Detection found no face for submission `submission`
    NoFaceDetected { submission: u64 },
    /// Detection failed for submission `submission`
    DetectionFailed { submission: u64, cause: SubmitError },
    /// The user asked to take another photo
    Retake,
}

impl WorkflowEvent {
    fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::BeginCapture => "begin_capture",
            WorkflowEvent::ImageCaptured(_) => "image_captured",
            WorkflowEvent::Submit => "submit",
            WorkflowEvent::DetectionSucceeded { .. } => "detection_succeeded",
            WorkflowEvent::NoFaceDetected { .. } => "no_face_detected",
            WorkflowEvent::DetectionFailed { .. } => "detection_failed",
            WorkflowEvent::Retake => "retake",
        }
    }

    /// Submission a completion event belongs to
    fn submission(&self) -> Option<u64> {
        match self {
            WorkflowEvent::DetectionSucceeded { submission, .. }
            | WorkflowEvent::NoFaceDetected { submission }
            | WorkflowEvent::DetectionFailed { submission, .. } => Some(*submission),
            _ => None,
        }
    }
}

/// Reason for entering a state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    CaptureStarted,
    ImageCaptured,
    ImageReplaced,
    SubmissionStarted,
    EmotionsDetected,
    NoFaceDetected,
    Error { message: String },
    UserRetake,
}

/// Result of a state transition
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    pub previous_phase: WorkflowPhase,
    pub new_phase: WorkflowPhase,
    pub reason: TransitionReason,
}

/// Workflow state machine
///
/// Not synchronised itself; the orchestrator keeps it behind a single mutex
/// so each transition is applied atomically.
#[derive(Debug)]
pub struct WorkflowStateMachine {
    state: WorkflowState,
    /// Incremented whenever a submission starts or the machine is reset
    submission: u64,
}

impl WorkflowStateMachine {
    /// Creates a new state machine in the Idle state
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Idle,
            submission: 0,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Number of the most recently started submission
    pub fn submission(&self) -> u64 {
        self.submission
    }

    /// Process an event and return the transition result if a transition occurred
    ///
    /// Returns `None` if the event is not valid for the current state, including
    /// detection results for a submission that is no longer active.
    pub fn process_event(&mut self, event: WorkflowEvent) -> Option<TransitionResult> {
        let previous_phase = self.state.phase();

        if let Some(submission) = event.submission() {
            if previous_phase != WorkflowPhase::Submitting || submission != self.submission {
                tracing::warn!(
                    "Discarding stale {} for submission {} (current submission {}, state {:?})",
                    event.name(),
                    submission,
                    self.submission,
                    previous_phase
                );
                return None;
            }
        }

        let current = std::mem::take(&mut self.state);
        let (next, reason) = match (current, event) {
            (WorkflowState::Idle, WorkflowEvent::BeginCapture) => {
                (WorkflowState::Capturing, TransitionReason::CaptureStarted)
            }
            (
                WorkflowState::Idle | WorkflowState::Capturing,
                WorkflowEvent::ImageCaptured(image),
            ) => (
                WorkflowState::ReadyToSubmit { image },
                TransitionReason::ImageCaptured,
            ),
            (WorkflowState::ReadyToSubmit { .. }, WorkflowEvent::ImageCaptured(image)) => (
                WorkflowState::ReadyToSubmit { image },
                TransitionReason::ImageReplaced,
            ),
            (WorkflowState::ReadyToSubmit { image }, WorkflowEvent::Submit) => {
                self.submission += 1;
                (
                    WorkflowState::Submitting { image },
                    TransitionReason::SubmissionStarted,
                )
            }
            (
                WorkflowState::Submitting { image },
                WorkflowEvent::DetectionSucceeded { emotions, .. },
            ) => (
                WorkflowState::Resolved { image, emotions },
                TransitionReason::EmotionsDetected,
            ),
            (WorkflowState::Submitting { .. }, WorkflowEvent::NoFaceDetected { .. }) => {
                (WorkflowState::EmptyResult, TransitionReason::NoFaceDetected)
            }
            (WorkflowState::Submitting { .. }, WorkflowEvent::DetectionFailed { cause, .. }) => {
                let message = cause.to_string();
                (
                    WorkflowState::Error { cause },
                    TransitionReason::Error { message },
                )
            }
            (
                WorkflowState::Capturing
                | WorkflowState::ReadyToSubmit { .. }
                | WorkflowState::Resolved { .. }
                | WorkflowState::EmptyResult
                | WorkflowState::Error { .. },
                WorkflowEvent::Retake,
            ) => (WorkflowState::Idle, TransitionReason::UserRetake),

            // Invalid transitions
            (current, event) => {
                tracing::debug!(
                    "Ignoring {} in state {:?}",
                    event.name(),
                    current.phase()
                );
                self.state = current;
                return None;
            }
        };

        self.state = next;

        let result = TransitionResult {
            previous_phase,
            new_phase: self.state.phase(),
            reason,
        };

        tracing::info!(
            "Workflow state transition: {:?} -> {:?} (reason: {:?})",
            result.previous_phase,
            result.new_phase,
            result.reason
        );

        Some(result)
    }

    /// Force the machine back to Idle
    ///
    /// Any submission still in flight becomes stale.
    pub fn reset(&mut self) {
        self.state = WorkflowState::Idle;
        self.submission += 1;
        tracing::info!("Workflow state machine reset to Idle");
    }
}

impl Default for WorkflowStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
