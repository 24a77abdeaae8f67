//! Authentication
//!
//! Only the presence or absence of a session is consumed here.

use async_trait::async_trait;

pub mod session;

pub use session::{Session, SessionHandle};

/// Yields the current authenticated identity, if any
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// `None` when signed out or expired
    async fn current_session(&self) -> Option<Session>;
}
