//! Session state
//!
//! The session lifecycle (sign-in, token refresh) belongs to the host
//! application; this module only holds the current session and answers
//! whether one is active.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::SessionProvider;

/// Authenticated user session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// ID of the signed-in user (matches `profiles.id`)
    pub user_id: String,
    /// When session expires; `None` means it does not expire on its own
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            expires_at: None,
        }
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < Utc::now())
    }
}

/// Holds the current session, set by the host application
#[derive(Debug, Default)]
pub struct SessionHandle {
    current: RwLock<Option<Session>>,
}

impl SessionHandle {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(session: Session) -> Self {
        Self {
            current: RwLock::new(Some(session)),
        }
    }

    pub async fn sign_in(&self, session: Session) {
        tracing::debug!(user_id = %session.user_id, "Session set");
        *self.current.write().await = Some(session);
    }

    pub async fn sign_out(&self) {
        *self.current.write().await = None;
    }
}

#[async_trait]
impl SessionProvider for SessionHandle {
    async fn current_session(&self) -> Option<Session> {
        let session = self.current.read().await.clone()?;
        if session.is_expired() {
            tracing::debug!(user_id = %session.user_id, "Session expired");
            return None;
        }
        Some(session)
    }
}
