//! Capture, detect, recommend orchestration
//!
//! [`Workflow`] owns the session, the identity lookup status and the state
//! machine for one page view, and sequences the remote calls:
//!
//! 1. Mount: parse the redirect fragment, start the identity lookup
//! 2. Capture: the camera widget feeds images through a [`CaptureController`]
//! 3. Submit: post the image, then resolve / empty / error
//! 4. Retake: back to idle
//!
//! The identity lookup and the capture/submit flow are independent tasks.
//! Locks are never held across an `.await`.

pub mod state;
pub mod view;

pub use state::{
    TransitionReason, TransitionResult, WorkflowEvent, WorkflowPhase, WorkflowState,
    WorkflowStateMachine,
};
pub use view::{render_view, ProfileView, WorkflowView};

use crate::capture::CaptureController;
use crate::config::Config;
use crate::detection::{Detection, DetectionClient, EmotionDetector, EmotionProfile};
use crate::session::{IdentityClient, IdentityProvider, IdentityStatus, Session};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// What happened to a submit trigger
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Not in ReadyToSubmit (including a submission already in flight); no call made
    Ignored,
    /// The detection result was applied
    Completed(TransitionResult),
    /// The workflow moved on before the result arrived; result dropped
    Discarded,
}

/// Input handed to the recommendation stage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub emotions: EmotionProfile,
    pub token: String,
    pub user_id: String,
}

/// Session and identity lookup status, always updated together
#[derive(Debug)]
struct IdentitySlot {
    session: Session,
    status: IdentityStatus,
    /// Set once the single lookup attempt has begun
    started: bool,
}

/// Orchestrator for one page view
pub struct Workflow {
    machine: Arc<Mutex<WorkflowStateMachine>>,
    identity: Mutex<IdentitySlot>,
    detector: Arc<dyn EmotionDetector>,
    identity_provider: Arc<dyn IdentityProvider>,
}

impl Workflow {
    /// Creates a workflow in the Idle state
    pub fn new(
        session: Session,
        detector: Arc<dyn EmotionDetector>,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        let status = if session.is_authenticated() {
            IdentityStatus::Pending
        } else {
            IdentityStatus::Unauthenticated
        };

        Self {
            machine: Arc::new(Mutex::new(WorkflowStateMachine::new())),
            identity: Mutex::new(IdentitySlot {
                session,
                status,
                started: false,
            }),
            detector,
            identity_provider,
        }
    }

    /// Build a workflow against the configured services and start the identity lookup
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount(fragment: &str, config: &Config) -> Result<Arc<Self>> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .context("Workflow::mount requires a Tokio runtime")?;

        let detector = DetectionClient::new(&config.detection)?;
        let identity_provider = IdentityClient::new(&config.identity)?;
        let session = Session::from_fragment(fragment);

        let workflow = Arc::new(Self::new(
            session,
            Arc::new(detector),
            Arc::new(identity_provider),
        ));

        let task = Arc::clone(&workflow);
        runtime.spawn(async move { task.load_identity().await });

        tracing::info!("Workflow mounted");
        Ok(workflow)
    }

    /// Handle for the capture capability
    pub fn capture_controller(&self) -> CaptureController {
        CaptureController::new(Arc::clone(&self.machine))
    }

    /// Submit the pending image to the detection service
    ///
    /// Only valid in ReadyToSubmit. The result is applied only if this
    /// submission is still the active one when it completes.
    pub async fn submit(&self) -> SubmitOutcome {
        let (submission, image) = {
            let mut machine = self.machine.lock();
            if machine.process_event(WorkflowEvent::Submit).is_none() {
                tracing::debug!("Submit ignored in state {:?}", machine.state().phase());
                return SubmitOutcome::Ignored;
            }
            match machine.state().image() {
                Some(image) => (machine.submission(), image.clone()),
                None => return SubmitOutcome::Ignored,
            }
        };

        tracing::info!("Submitting image for emotion detection (submission {})", submission);

        let event = match self.detector.detect(image).await {
            Ok(Detection::Face(emotions)) => {
                WorkflowEvent::DetectionSucceeded { submission, emotions }
            }
            Ok(Detection::NoFace) => {
                tracing::info!("Detection found no face (submission {})", submission);
                WorkflowEvent::NoFaceDetected { submission }
            }
            Err(cause) => {
                tracing::error!("Emotion detection failed (submission {}): {}", submission, cause);
                WorkflowEvent::DetectionFailed { submission, cause }
            }
        };

        match self.machine.lock().process_event(event) {
            Some(result) => SubmitOutcome::Completed(result),
            None => SubmitOutcome::Discarded,
        }
    }

    /// Fetch the user's identity and record it in the session
    ///
    /// The lookup is attempted at most once per workflow; later calls return
    /// the current status without contacting the service. Failures are
    /// recorded, never propagated.
    pub async fn load_identity(&self) -> IdentityStatus {
        let token = {
            let mut slot = self.identity.lock();
            if slot.started || slot.status != IdentityStatus::Pending {
                tracing::debug!("Identity lookup already attempted ({:?})", slot.status);
                return slot.status.clone();
            }
            slot.started = true;
            match slot.session.token.clone() {
                Some(token) => token,
                None => {
                    slot.status = IdentityStatus::Unauthenticated;
                    return slot.status.clone();
                }
            }
        };

        let result = self.identity_provider.fetch_identity(&token).await;

        let mut slot = self.identity.lock();
        let status = match result {
            Ok(identity) => {
                tracing::info!("Identity loaded for user {}", identity.id);
                slot.session.apply_identity(&identity);
                IdentityStatus::Loaded(identity)
            }
            Err(e) => {
                tracing::warn!("Failed to load identity: {}", e);
                IdentityStatus::Failed(e.to_string())
            }
        };
        slot.status = status.clone();
        status
    }

    /// Run [`Workflow::load_identity`] as an independent task
    pub fn spawn_identity_load(self: &Arc<Self>) -> JoinHandle<IdentityStatus> {
        let workflow = Arc::clone(self);
        tokio::spawn(async move { workflow.load_identity().await })
    }

    /// Discard the current image or result and return to Idle
    pub fn retake(&self) -> Option<TransitionResult> {
        self.machine.lock().process_event(WorkflowEvent::Retake)
    }

    /// Tear down: force Idle and drop any in-flight submission's result
    pub fn reset(&self) {
        self.machine.lock().reset();
    }

    pub fn state(&self) -> WorkflowState {
        self.machine.lock().state().clone()
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.machine.lock().state().phase()
    }

    pub fn session(&self) -> Session {
        self.identity.lock().session.clone()
    }

    pub fn identity_status(&self) -> IdentityStatus {
        self.identity.lock().status.clone()
    }

    /// Current view state for the renderer
    pub fn view(&self) -> WorkflowView {
        let state = self.state();
        let (session, status) = {
            let slot = self.identity.lock();
            (slot.session.clone(), slot.status.clone())
        };
        render_view(&state, &session, &status)
    }

    /// Input for the recommendation stage, once emotions and identity are known
    pub fn recommendation_request(&self) -> Option<RecommendationRequest> {
        let emotions = self.machine.lock().state().emotions().cloned()?;
        let slot = self.identity.lock();

        Some(RecommendationRequest {
            emotions,
            token: slot.session.token.clone()?,
            user_id: slot.session.user_id.clone()?,
        })
    }
}
