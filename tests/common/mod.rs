#![allow(dead_code)]

use async_trait::async_trait;
use docspace::config::{DownloadVariant, PolicyConfig};
use docspace::remote::{DocumentStore, RemoteFile, UploadRequest};
use docspace::workspace::{Confirm, DocumentId, DocumentSummary};
use docspace::{Role, Session, SessionStore, WorkspaceController, WorkspaceError, WorkspaceResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const TOKEN: &str = "valid-token";

struct StoredDocument {
    summary: DocumentSummary,
    text: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct State {
    documents: Vec<StoredDocument>,
    next_id: u64,
    offline: bool,
    list_down: bool,
    omit_disposition: bool,
    calls: usize,
}

/// In-memory stand-in for the remote store. Filtering is done here, the
/// way the real store does it, so tests can tell it apart from anything
/// the client might do locally.
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<State>,
    delays: Mutex<HashMap<String, Duration>>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                next_id: 100,
                ..State::default()
            }),
            delays: Mutex::new(HashMap::new()),
        })
    }

    pub fn add(&self, id: u64, filename: &str, text: &str) {
        self.state.lock().documents.push(StoredDocument {
            summary: summary(id, filename),
            text: text.to_string(),
            bytes: format!("%PDF {filename}").into_bytes(),
        });
    }

    pub fn remove_all(&self) {
        self.state.lock().documents.clear();
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Fail only the full listing; every other call still works.
    pub fn set_list_down(&self, down: bool) {
        self.state.lock().list_down = down;
    }

    pub fn omit_disposition(&self) {
        self.state.lock().omit_disposition = true;
    }

    /// Delay responses for a keyword (global or per-document) or for `"list"`.
    pub fn delay(&self, key: &str, delay: Duration) {
        self.delays.lock().insert(key.to_string(), delay);
    }

    pub fn calls(&self) -> usize {
        self.state.lock().calls
    }

    async fn wait(&self, key: &str) {
        let delay = self.delays.lock().get(key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn enter(&self, token: &str) -> WorkspaceResult<()> {
        let mut state = self.state.lock();
        state.calls += 1;
        if state.offline {
            return Err(WorkspaceError::RemoteUnavailable("connection refused".into()));
        }
        if token != TOKEN {
            return Err(WorkspaceError::Unauthorized("401 Unauthorized".into()));
        }
        Ok(())
    }
}

pub fn summary(id: u64, filename: &str) -> DocumentSummary {
    DocumentSummary {
        id: DocumentId(id),
        filename: filename.to_string(),
        uploaded_at: "2025-01-15 09:30:00".to_string(),
        owner_id: Some(1),
        owner_name: Some("admin".to_string()),
        mime_type: Some("application/pdf".to_string()),
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn list(&self, token: &str) -> WorkspaceResult<Vec<DocumentSummary>> {
        self.enter(token)?;
        if self.state.lock().list_down {
            return Err(WorkspaceError::RemoteUnavailable("502 Bad Gateway".into()));
        }
        self.wait("list").await;
        Ok(self
            .state
            .lock()
            .documents
            .iter()
            .map(|d| d.summary.clone())
            .collect())
    }

    async fn search(&self, token: &str, keyword: &str) -> WorkspaceResult<Vec<DocumentSummary>> {
        self.enter(token)?;
        self.wait(keyword).await;
        let needle = keyword.to_lowercase();
        Ok(self
            .state
            .lock()
            .documents
            .iter()
            .filter(|d| d.text.to_lowercase().contains(&needle))
            .map(|d| d.summary.clone())
            .collect())
    }

    async fn upload(
        &self,
        token: &str,
        request: UploadRequest,
    ) -> WorkspaceResult<DocumentSummary> {
        self.enter(token)?;
        let mut state = self.state.lock();
        state.next_id += 1;
        let mut created = summary(state.next_id, &request.filename);
        created.owner_id = request.owner_id.parse().ok();
        created.mime_type = Some(request.mime_type);
        state.documents.push(StoredDocument {
            summary: created.clone(),
            text: String::from_utf8_lossy(&request.bytes).into_owned(),
            bytes: request.bytes,
        });
        Ok(created)
    }

    async fn delete(&self, token: &str, id: DocumentId) -> WorkspaceResult<()> {
        self.enter(token)?;
        let mut state = self.state.lock();
        let before = state.documents.len();
        state.documents.retain(|d| d.summary.id != id);
        if state.documents.len() == before {
            return Err(WorkspaceError::NotFound("Document not found".into()));
        }
        Ok(())
    }

    async fn fetch(
        &self,
        token: &str,
        id: DocumentId,
        variant: DownloadVariant,
    ) -> WorkspaceResult<RemoteFile> {
        self.enter(token)?;
        let state = self.state.lock();
        let doc = state
            .documents
            .iter()
            .find(|d| d.summary.id == id)
            .ok_or_else(|| WorkspaceError::NotFound(format!("document {id}")))?;
        let (bytes, name) = match variant {
            DownloadVariant::Derived => (
                doc.text.clone().into_bytes(),
                format!("{}.txt", doc.summary.filename),
            ),
            DownloadVariant::Raw => (doc.bytes.clone(), doc.summary.filename.clone()),
        };
        Ok(RemoteFile {
            bytes,
            content_disposition: (!state.omit_disposition)
                .then(|| format!("attachment; filename=\"{name}\"")),
            content_type: Some("text/plain".into()),
        })
    }

    async fn search_in_document(
        &self,
        token: &str,
        id: DocumentId,
        keyword: &str,
    ) -> WorkspaceResult<Vec<String>> {
        self.enter(token)?;
        self.wait(keyword).await;
        let needle = keyword.to_lowercase();
        let state = self.state.lock();
        let doc = state
            .documents
            .iter()
            .find(|d| d.summary.id == id)
            .ok_or_else(|| WorkspaceError::NotFound(format!("document {id}")))?;
        Ok(doc
            .text
            .lines()
            .filter(|line| line.to_lowercase().contains(&needle))
            .map(str::to_string)
            .collect())
    }

    fn viewer_url(&self, id: DocumentId, query: Option<&str>) -> String {
        match query {
            Some(q) => format!("fake://{id}/file#search={q}"),
            None => format!("fake://{id}/file"),
        }
    }
}

/// Confirmation gate that records how often it was asked.
pub struct CountingConfirm {
    answer: bool,
    asked: AtomicUsize,
    last_message: Mutex<Option<String>>,
}

impl CountingConfirm {
    pub fn new(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            asked: AtomicUsize::new(0),
            last_message: Mutex::new(None),
        })
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }

    pub fn last_message(&self) -> Option<String> {
        self.last_message.lock().clone()
    }
}

#[async_trait]
impl Confirm for CountingConfirm {
    async fn confirm(&self, message: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        *self.last_message.lock() = Some(message.to_string());
        self.answer
    }
}

pub fn admin_session() -> Session {
    Session::new("1", Role::Admin, TOKEN)
}

pub fn user_session() -> Session {
    Session::new("2", Role::User, TOKEN)
}

pub struct Harness {
    pub store: Arc<FakeStore>,
    pub sessions: Arc<SessionStore>,
    pub confirm: Arc<CountingConfirm>,
    pub controller: WorkspaceController,
}

pub fn harness(session: Option<Session>) -> Harness {
    harness_with(session, PolicyConfig::default(), true)
}

pub fn harness_with(session: Option<Session>, policy: PolicyConfig, confirm: bool) -> Harness {
    let store = FakeStore::new();
    let sessions = Arc::new(match session {
        Some(s) => SessionStore::with_session(s),
        None => SessionStore::new(),
    });
    let confirm = CountingConfirm::new(confirm);
    let controller = WorkspaceController::new(
        Arc::clone(&sessions),
        store.clone(),
        confirm.clone(),
    )
    .with_policy(policy);
    Harness {
        store,
        sessions,
        confirm,
        controller,
    }
}
