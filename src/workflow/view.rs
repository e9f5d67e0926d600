//! View state for the rendering layer
//!
//! Rendering is an external collaborator. It receives a [`WorkflowView`]
//! derived from the workflow state, the session and the identity lookup, and
//! has no behaviour of its own.

use super::state::{WorkflowPhase, WorkflowState};
use crate::capture::CapturedImage;
use crate::detection::{EmotionLabel, EmotionProfile};
use crate::session::{IdentityStatus, Session};
use serde::Serialize;

const NO_FACE_MESSAGE: &str = "No face detected. Please retake the photo.";
const SUBMIT_FAILED_MESSAGE: &str = "Could not read your mood. Please try again.";
const PROFILE_UNAVAILABLE_MESSAGE: &str = "Could not load profile";

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowView {
    pub phase: WorkflowPhase,
    pub description: String,
    /// Show an indeterminate busy indicator and accept no submit trigger
    pub busy: bool,
    pub can_submit: bool,
    pub can_retake: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<CapturedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotions: Option<EmotionProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_emotion: Option<EmotionLabel>,
    /// User-facing status message for empty and failed results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub profile: ProfileView,
}

/// Identity section of the view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Derive the view for the current state
pub fn render_view(
    state: &WorkflowState,
    session: &Session,
    identity: &IdentityStatus,
) -> WorkflowView {
    let phase = state.phase();
    let emotions = state.emotions().cloned();

    let message = match state {
        WorkflowState::EmptyResult => Some(NO_FACE_MESSAGE.to_string()),
        WorkflowState::Error { .. } => Some(SUBMIT_FAILED_MESSAGE.to_string()),
        _ => None,
    };

    WorkflowView {
        phase,
        description: phase.description().to_string(),
        busy: state.is_busy(),
        can_submit: state.can_submit(),
        can_retake: state.can_retake(),
        image: state.image().cloned(),
        dominant_emotion: emotions
            .as_ref()
            .and_then(|e| e.dominant())
            .map(|(label, _)| label),
        emotions,
        message,
        profile: render_profile(session, identity),
    }
}

fn render_profile(session: &Session, identity: &IdentityStatus) -> ProfileView {
    let message = match identity {
        IdentityStatus::Unauthenticated | IdentityStatus::Failed(_) => {
            Some(PROFILE_UNAVAILABLE_MESSAGE.to_string())
        }
        _ => None,
    };

    ProfileView {
        loading: *identity == IdentityStatus::Pending,
        display_name: session.user_display_name.clone(),
        user_id: session.user_id.clone(),
        message,
    }
}
