//! Password gate and session registry
//!
//! A session starts on a successful password check and ends on logout or when
//! it outlives [`SESSION_TTL`]. Sessions live in memory only; expired entries
//! are pruned on every login, so the set stays bounded by the login rate.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Incorrect password. Access denied.")]
    IncorrectPassword,

    #[error("Access is not configured.")]
    NotConfigured,
}

/// Opaque session token handed to the browser as a cookie
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionToken {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// How long a session stays valid after login
pub const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

pub struct AuthGate {
    password: Option<String>,
    ttl: Duration,
    /// Open sessions and when they started
    sessions: Mutex<HashMap<SessionToken, Instant>>,
}

impl AuthGate {
    /// A gate with no password refuses every login
    pub fn new(password: Option<String>) -> Self {
        Self::with_ttl(password, SESSION_TTL)
    }

    pub fn with_ttl(password: Option<String>, ttl: Duration) -> Self {
        let password = password.filter(|p| !p.is_empty());
        if password.is_none() {
            tracing::warn!("no access password configured; all logins will be refused");
        }
        Self {
            password,
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Check a password and open a session on success
    pub fn login(&self, attempt: &str) -> Result<SessionToken, AuthError> {
        let expected = self.password.as_deref().ok_or(AuthError::NotConfigured)?;
        if attempt != expected {
            tracing::info!("rejected login attempt");
            return Err(AuthError::IncorrectPassword);
        }
        let token = SessionToken(Uuid::new_v4().to_string());
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, started| started.elapsed() < self.ttl);
        if sessions.len() < before {
            tracing::debug!(expired = before - sessions.len(), "pruned expired sessions");
        }
        sessions.insert(token.clone(), Instant::now());
        tracing::info!("session opened");
        Ok(token)
    }

    /// Close a session. Unknown tokens are ignored.
    pub fn logout(&self, token: &SessionToken) {
        if self.lock().remove(token).is_some() {
            tracing::info!("session closed");
        }
    }

    /// True for a known session that has not expired
    pub fn is_active(&self, token: &SessionToken) -> bool {
        self.lock()
            .get(token)
            .is_some_and(|started| started.elapsed() < self.ttl)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SessionToken, Instant>> {
        // A panic while holding the lock cannot leave the set half-updated
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
