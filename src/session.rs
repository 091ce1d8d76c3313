//! The "current session" capability handed to the API clients.
//!
//! Clients never read credentials from ambient storage; they ask the
//! [`SessionProvider`] they were built with. A provider that returns `None`
//! makes every authenticated call fail with `AppError::AuthRequired` before
//! any request is sent.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

pub trait SessionProvider: Send + Sync {
    /// The credential to attach, or `None` when absent or expired.
    fn current(&self) -> Option<Credential>;
}

/// A replaceable session slot shared between the auth client and every other client.
#[derive(Clone, Default)]
pub struct SharedSession {
    inner: Arc<RwLock<Option<Credential>>>,
}

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        let session = Self::new();
        session.set(credential);
        session
    }

    pub fn set(&self, credential: Credential) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(credential);
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }
}

impl SessionProvider for SharedSession {
    fn current(&self) -> Option<Credential> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|c| !c.is_expired_at(Utc::now()))
            .cloned()
    }
}

/// No session at all; useful for guest flows and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl SessionProvider for Anonymous {
    fn current(&self) -> Option<Credential> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn expired_credentials_are_hidden() {
        let session = SharedSession::with_credential(Credential::new(
            "tok",
            Some(Utc::now() - Duration::minutes(1)),
        ));
        assert!(session.current().is_none());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn set_and_clear() {
        let session = SharedSession::new();
        assert!(session.current().is_none());
        session.set(Credential::new("tok", None));
        assert_eq!(session.current().map(|c| c.token), Some("tok".to_string()));
        session.clear();
        assert!(session.current().is_none());
    }

    #[test]
    fn debug_output_hides_token() {
        let rendered = format!("{:?}", Credential::new("secret-token", None));
        assert!(!rendered.contains("secret-token"));
    }
}
