use super::{Role, Session};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Flat on-disk form of a session. Every value is an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

impl From<&Session> for SessionRecord {
    fn from(session: &Session) -> Self {
        Self {
            token: session.token.clone(),
            user_id: session.user_id.clone(),
            username: session.username.clone().unwrap_or_default(),
            email: session.email.clone().unwrap_or_default(),
            role: session.role.as_str().to_string(),
        }
    }
}

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
        Self {
            role: Role::parse_lenient(Some(&record.role)),
            user_id: record.user_id,
            token: record.token,
            username: non_empty(record.username),
            email: non_empty(record.email),
        }
    }
}

/// JSON file holding the last signed-in session for the command line.
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let record: SessionRecord =
            serde_json::from_str(&raw).context("Session file is not valid JSON")?;
        Ok(Some(record.into()))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create session directory")?;
        }
        let body = serde_json::to_string_pretty(&SessionRecord::from(session))?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to delete session file")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("nested/session.json"));
        assert!(file.load().unwrap().is_none());

        let mut session = Session::new("7", Role::Admin, "tok");
        session.username = Some("admin".into());
        file.save(&session).unwrap();
        assert_eq!(file.load().unwrap(), Some(session));

        file.clear().unwrap();
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn record_uses_flat_camel_case_keys() {
        let session = Session::new("3", Role::User, "abc");
        let json = serde_json::to_value(SessionRecord::from(&session)).unwrap();
        assert_eq!(json["userId"], "3");
        assert_eq!(json["role"], "USER");
        assert_eq!(json["token"], "abc");
        assert_eq!(json["email"], "");
    }
}
