//! Error taxonomy shared by every workspace operation.
//!
//! Each operation either applies its full effect or fails with exactly one
//! of these kinds.

use reqwest::StatusCode;

#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkspaceError {
    /// No session, an expired credential, or a role that may not perform
    /// the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Transport failure or a non-2xx response not covered by another kind.
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Discriminant of [`WorkspaceError`] without the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    Validation,
    NotFound,
    RemoteUnavailable,
    Conflict,
}

impl WorkspaceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::RemoteUnavailable(_) => ErrorKind::RemoteUnavailable,
            Self::Conflict(_) => ErrorKind::Conflict,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }

    pub(crate) fn no_session() -> Self {
        Self::Unauthorized("no active session".to_string())
    }
}

impl From<reqwest::Error> for WorkspaceError {
    fn from(err: reqwest::Error) -> Self {
        Self::RemoteUnavailable(err.to_string())
    }
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

/// Map a non-success HTTP status (plus whatever body text came back) onto
/// the taxonomy.
pub fn classify_status(status: StatusCode, body: &str) -> WorkspaceError {
    let body = body.trim();
    let message = if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => WorkspaceError::Unauthorized(message),
        StatusCode::NOT_FOUND => WorkspaceError::NotFound(message),
        StatusCode::BAD_REQUEST => WorkspaceError::Validation(message),
        StatusCode::CONFLICT => WorkspaceError::Conflict(message),
        _ => WorkspaceError::RemoteUnavailable(message),
    }
}
