//! Page session
//!
//! Credentials handed over by the identity-provider redirect, plus the
//! identity of the user they belong to once it has been fetched.

pub mod fragment;
pub mod identity;

pub use fragment::extract;
pub use identity::{Identity, IdentityClient, IdentityError, IdentityProvider};

use serde::{Deserialize, Serialize};

/// Credentials and identity for one page view
///
/// The token is captured once from the redirect fragment and never refreshed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token (absent if the redirect carried none)
    pub token: Option<String>,
    /// Token type reported by the provider (normally "Bearer")
    pub token_type: Option<String>,
    /// Token lifetime in seconds
    pub expires_in: Option<u64>,
    /// Display name of the authenticated user
    pub user_display_name: Option<String>,
    /// Id of the authenticated user
    pub user_id: Option<String>,
}

impl Session {
    /// Build a session from the redirect fragment
    pub fn from_fragment(fragment: &str) -> Self {
        let mut params = extract(fragment);

        let token = params.remove("access_token").filter(|t| !t.is_empty());
        let expires_in = params
            .get("expires_in")
            .and_then(|v| v.trim().parse::<u64>().ok());

        if token.is_none() {
            tracing::warn!("Redirect fragment carried no access token; continuing unauthenticated");
        }

        Self {
            token,
            token_type: params.remove("token_type"),
            expires_in,
            user_display_name: None,
            user_id: None,
        }
    }

    /// Whether a bearer token is available
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Record a fetched identity
    pub(crate) fn apply_identity(&mut self, identity: &Identity) {
        self.user_display_name = identity.display_name.clone();
        self.user_id = Some(identity.id.clone());
    }
}

/// Progress of the independent identity lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum IdentityStatus {
    /// No token, so no lookup is attempted
    Unauthenticated,
    /// Lookup not finished yet
    #[default]
    Pending,
    /// Lookup succeeded
    Loaded(Identity),
    /// Lookup failed; the page carries on without personalisation
    Failed(String),
}
