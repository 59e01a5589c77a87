//! Authenticated identity for the lifetime of a workspace.
//!
//! A [`SessionStore`] is created by the caller and handed to the
//! controller; nothing in the crate reaches for ambient global state.

pub mod persist;

pub use persist::{SessionFile, SessionRecord};

use crate::error::{WorkspaceError, WorkspaceResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }

    /// Lenient parse used for server-issued roles: unknown or blank values
    /// fall back to `USER`, the store's default role.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        raw.and_then(|r| r.parse().ok()).unwrap_or(Self::User)
    }
}

impl FromStr for Role {
    type Err = WorkspaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        match normalized.strip_prefix("ROLE_").unwrap_or(&normalized) {
            "ADMIN" => Ok(Self::Admin),
            "USER" => Ok(Self::User),
            other => Err(WorkspaceError::Validation(format!("unknown role '{other}'"))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
    pub token: String,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, role: Role, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            token: token.into(),
            username: None,
            email: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Holder of the current [`Session`], if any.
#[derive(Debug, Default)]
pub struct SessionStore {
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            current: RwLock::new(Some(session)),
        }
    }

    pub fn sign_in(&self, session: Session) {
        *self.current.write() = Some(session);
    }

    pub fn sign_out(&self) -> Option<Session> {
        self.current.write().take()
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().clone()
    }

    pub fn is_active(&self) -> bool {
        self.current.read().is_some()
    }

    /// The active session or `Unauthorized`.
    pub fn require(&self) -> WorkspaceResult<Session> {
        self.current().ok_or_else(WorkspaceError::no_session)
    }

    /// Drop the session because the remote rejected its credential.
    /// Only tears down if the rejected token is still the active one, so a
    /// stale response cannot log out a fresher session.
    pub(crate) fn revoke(&self, token: &str) {
        let mut current = self.current.write();
        if current.as_ref().is_some_and(|s| s.token == token) {
            warn!("remote rejected session credential; re-authentication required");
            *current = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" User ".parse::<Role>().unwrap(), Role::User);
        assert_eq!("ROLE_ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("guest".parse::<Role>().is_err());
    }

    #[test]
    fn lenient_role_defaults_to_user() {
        assert_eq!(Role::parse_lenient(None), Role::User);
        assert_eq!(Role::parse_lenient(Some("")), Role::User);
        assert_eq!(Role::parse_lenient(Some("admin")), Role::Admin);
    }

    #[test]
    fn require_without_session_is_unauthorized() {
        let store = SessionStore::new();
        let err = store.require().unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn revoke_ignores_stale_tokens() {
        let store = SessionStore::with_session(Session::new("1", Role::Admin, "fresh"));
        store.revoke("stale");
        assert!(store.is_active());
        store.revoke("fresh");
        assert!(!store.is_active());
    }
}
