//! Login and registration against the user service.

use crate::error::{WorkspaceError, WorkspaceResult};
use crate::remote::http::ensure_success;
use crate::session::{Role, Session, SessionStore};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Self {
            role: Role::parse_lenient(response.role.as_deref()),
            user_id: response.id,
            token: response.token,
            username: response.username,
            email: response.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> WorkspaceResult<()> {
        if self.username.trim().is_empty() {
            return Err(WorkspaceError::Validation("username is required".into()));
        }
        let email_ok = self
            .email
            .trim()
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !self.email.trim().contains(char::is_whitespace)
            });
        if !email_ok {
            return Err(WorkspaceError::Validation(format!(
                "'{}' is not a valid email address",
                self.email
            )));
        }
        if self.password.is_empty() {
            return Err(WorkspaceError::Validation("password is required".into()));
        }
        Ok(())
    }
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> WorkspaceResult<LoginResponse>;

    async fn register(&self, request: &RegisterRequest) -> WorkspaceResult<()>;
}

/// Authenticate and install the resulting session.
pub async fn sign_in(
    service: &dyn AuthService,
    store: &SessionStore,
    username: &str,
    password: &str,
) -> WorkspaceResult<Session> {
    let session: Session = service.login(username, password).await?.into();
    info!(user_id = %session.user_id, role = %session.role, "signed in");
    store.sign_in(session.clone());
    Ok(session)
}

/// [`AuthService`] over `<base>/api/users`.
pub struct HttpAuthService {
    client: Client,
    base_url: String,
}

impl HttpAuthService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> WorkspaceResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[async_trait]
impl AuthService for HttpAuthService {
    async fn login(&self, username: &str, password: &str) -> WorkspaceResult<LoginResponse> {
        debug!(username, "logging in");
        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .json(&Credentials { username, password })
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn register(&self, request: &RegisterRequest) -> WorkspaceResult<()> {
        request.validate()?;
        debug!(username = %request.username, "registering");
        let response = self
            .client
            .post(format!("{}/register", self.base_url))
            .json(request)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

fn opaque_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n.to_string(),
        Raw::Text(s) => s,
    })
}
