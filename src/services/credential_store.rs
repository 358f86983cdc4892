use std::sync::RwLock;

use tracing::{debug, info, warn};

use crate::db::repositories::session_repository::{SessionRepository, SCOPE_DURABLE};
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::identity::AuthSession;

/// How long a saved session outlives the process. `Durable` survives
/// restarts (SQLite row), `Ephemeral` dies with the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistencePolicy {
    Durable,
    Ephemeral,
}

/// Holds the `{token, user}` pair across view loads. Two scopes exist;
/// reads always prefer the durable one so concurrent views resolve the
/// same identity. Values are stored as-is: the scopes are trust-boundary
/// bookkeeping, not secrecy.
pub struct CredentialStore {
    db: DbPool,
    ephemeral: RwLock<Option<AuthSession>>,
}

impl CredentialStore {
    pub fn new(db: DbPool) -> Self {
        Self {
            db,
            ephemeral: RwLock::new(None),
        }
    }

    /// Persist a session under the scope named by its policy. A failed
    /// durable write leaves no partial state; the caller must treat the
    /// session as unauthenticated.
    pub fn save(&self, session: &AuthSession, policy: PersistencePolicy) -> AppResult<()> {
        match policy {
            PersistencePolicy::Durable => {
                let user_json = serde_json::to_string(&session.user)?;
                self.db.with_connection(|conn| {
                    SessionRepository::upsert(conn, SCOPE_DURABLE, &session.token, &user_json)
                })?;
                info!(
                    target: "app::session",
                    username = %session.user.username,
                    role = %session.user.role,
                    "session saved to durable scope"
                );
            }
            PersistencePolicy::Ephemeral => {
                if let Ok(mut guard) = self.ephemeral.write() {
                    *guard = Some(session.clone());
                }
                info!(
                    target: "app::session",
                    username = %session.user.username,
                    role = %session.user.role,
                    "session saved to ephemeral scope"
                );
            }
        }

        Ok(())
    }

    /// Resolve the current session, durable scope first. A corrupt
    /// durable record is skipped (and logged) rather than surfaced, so a
    /// half-written row can never produce a divergent identity.
    pub fn load(&self) -> AppResult<Option<AuthSession>> {
        let durable = self
            .db
            .with_connection(|conn| SessionRepository::get(conn, SCOPE_DURABLE))?;

        if let Some(row) = durable {
            match serde_json::from_str(&row.user_json) {
                Ok(user) => {
                    return Ok(Some(AuthSession {
                        token: row.token,
                        user,
                    }));
                }
                Err(err) => {
                    warn!(
                        target: "app::session",
                        error = %err,
                        "stored durable identity is unreadable, falling back"
                    );
                }
            }
        }

        if let Ok(guard) = self.ephemeral.read() {
            if let Some(session) = guard.as_ref() {
                debug!(target: "app::session", "resolved session from ephemeral scope");
                return Ok(Some(session.clone()));
            }
        }

        Ok(None)
    }

    /// Current bearer token, if any. Callers must not cache it: logout
    /// in another view must be observed on the next call.
    pub fn token(&self) -> AppResult<Option<String>> {
        Ok(self.load()?.map(|session| session.token))
    }

    /// Empty both scopes unconditionally. The ephemeral scope is cleared
    /// first so a failing durable delete still leaves no in-process
    /// identity behind.
    pub fn clear(&self) -> AppResult<()> {
        if let Ok(mut guard) = self.ephemeral.write() {
            *guard = None;
        }

        self.db
            .with_connection(|conn| SessionRepository::delete_all(conn))?;

        info!(target: "app::session", "credential scopes cleared");
        Ok(())
    }
}
