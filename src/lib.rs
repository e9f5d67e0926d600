//! moodtune - mood-driven music suggestions
//!
//! Client-side core: read the streaming-service token from the login redirect,
//! capture a face, ask the emotion-detection service how it looks, and hand
//! the resulting mood to the recommendation stage.

pub mod capture;
pub mod config;
pub mod detection;
pub mod session;
pub mod workflow;

pub use capture::{CaptureController, CapturedImage};
pub use config::Config;
pub use detection::{Detection, EmotionDetector, EmotionLabel, EmotionProfile, SubmitError};
pub use session::{Identity, IdentityError, IdentityProvider, IdentityStatus, Session};
pub use workflow::{
    RecommendationRequest, SubmitOutcome, Workflow, WorkflowPhase, WorkflowState, WorkflowView,
};

/// Install the global tracing subscriber
///
/// Honours `RUST_LOG`, defaulting to `info`. Safe to call more than once;
/// later calls leave the first subscriber in place.
pub fn init_logging() {
    /// Format timestamps using the system's local time via chrono
    struct LocalTimer;
    impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
        fn format_time(
            &self,
            w: &mut tracing_subscriber::fmt::format::Writer<'_>,
        ) -> std::fmt::Result {
            write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
        }
    }

    let result = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_timer(LocalTimer)
        .try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
