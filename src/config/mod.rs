//! Configuration loaded from `config.toml` in the platform config directory.

pub mod schema;

pub use schema::{
    Config, DownloadVariant, LoggingConfig, PolicyConfig, ServerConfig, TransferConfig,
};

use crate::error::{WorkspaceError, WorkspaceResult};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const SERVER_URL_ENV: &str = "DOCSPACE_SERVER_URL";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "docspace")
}

/// Default location of `config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("config.toml"))
}

/// Default location of the persisted session.
pub fn default_session_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.data_dir().join("session.json"))
}

impl Config {
    /// Load from `path`, or from the default location. A missing file yields
    /// defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(expand(p)),
            None => default_config_path(),
        };
        let mut config = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(&p)
                    .with_context(|| format!("Failed to read {}", p.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("Failed to parse {}", p.display()))?
            }
            _ => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(SERVER_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.server.base_url = url.trim().to_string();
        }
    }

    pub fn validate(&self) -> WorkspaceResult<()> {
        if self.server.base_url.trim().is_empty() {
            return Err(WorkspaceError::Validation(
                "server.base_url must not be empty".into(),
            ));
        }
        if self.server.timeout_secs == 0 {
            return Err(WorkspaceError::Validation(
                "server.timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn documents_url(&self) -> String {
        format!("{}/api/documents", self.server.base_url.trim_end_matches('/'))
    }

    pub fn users_url(&self) -> String {
        format!("{}/api/users", self.server.base_url.trim_end_matches('/'))
    }

    pub fn output_dir(&self) -> PathBuf {
        expand(Path::new(&self.transfer.output_dir))
    }
}

fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(dir.path().join("absent.toml").as_path())).unwrap();
        assert_eq!(config.policy, PolicyConfig::default());
        assert_eq!(config.transfer.download_variant, DownloadVariant::Derived);
        assert_eq!(config.server.timeout_secs, 30);
    }

    #[test]
    fn partial_file_merges_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nbase_url = \"https://docs.example.com/\"\n\n[policy]\nallow_user_upload = true\n\n[transfer]\ndownload_variant = \"raw\"\n",
        )
        .unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert!(config.policy.allow_user_upload);
        assert!(!config.policy.allow_user_delete);
        assert_eq!(config.transfer.download_variant, DownloadVariant::Raw);
        assert_eq!(config.server.timeout_secs, 30);
        assert_eq!(
            config.documents_url(),
            "https://docs.example.com/api/documents"
        );
        assert_eq!(config.users_url(), "https://docs.example.com/api/users");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nbase_url = 1").unwrap();
        assert!(Config::load(Some(path.as_path())).is_err());
    }

    #[test]
    fn env_override_replaces_base_url() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| {
            (key == SERVER_URL_ENV).then(|| " http://10.0.0.5:9000 ".to_string())
        });
        assert_eq!(config.server.base_url, "http://10.0.0.5:9000");

        config.apply_env_overrides(|_| Some(String::new()));
        assert_eq!(config.server.base_url, "http://10.0.0.5:9000");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = Config::default();
        config.server.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
