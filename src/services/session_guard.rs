use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AppResult, ENTRY_REDIRECT};
use crate::models::identity::{Role, UserIdentity};
use crate::services::credential_store::CredentialStore;

/// Outcome of the once-per-view-open access check. `Redirect` means the
/// view must navigate away before issuing any protected network call;
/// `Grant` carries the identity the view binds into its header.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "decision", rename_all = "camelCase")]
pub enum GuardDecision {
    Grant { identity: UserIdentity },
    Redirect { target: String },
}

pub struct SessionGuard {
    credentials: Arc<CredentialStore>,
}

impl SessionGuard {
    pub fn new(credentials: Arc<CredentialStore>) -> Self {
        Self { credentials }
    }

    /// Role gate for a protected view. Runs exactly once per view open;
    /// it is not re-evaluated until the next navigation.
    pub fn authorize(&self, required: Role) -> AppResult<GuardDecision> {
        let Some(session) = self.credentials.load()? else {
            warn!(
                target: "app::session",
                required = %required,
                "no stored identity, redirecting to entry"
            );
            return Ok(GuardDecision::Redirect {
                target: ENTRY_REDIRECT.to_string(),
            });
        };

        if session.user.role != required {
            warn!(
                target: "app::session",
                required = %required,
                actual = %session.user.role,
                "role mismatch, redirecting to entry"
            );
            return Ok(GuardDecision::Redirect {
                target: ENTRY_REDIRECT.to_string(),
            });
        }

        debug!(
            target: "app::session",
            username = %session.user.username,
            role = %session.user.role,
            "view access granted"
        );

        Ok(GuardDecision::Grant {
            identity: session.user,
        })
    }

    pub fn current_identity(&self) -> AppResult<Option<UserIdentity>> {
        Ok(self.credentials.load()?.map(|session| session.user))
    }
}
