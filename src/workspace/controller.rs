use super::confirm::Confirm;
use super::registry::DocumentRegistry;
use super::schema::{DocumentId, DocumentSummary};
use super::search::{highlight, DocumentScope, GlobalScope, SearchCoordinator, Segment};
use super::transfer::{FileArtifact, TransferManager, TransferTask};
use crate::config::{DownloadVariant, PolicyConfig};
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::remote::DocumentStore;
use crate::session::{Session, SessionStore};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The user answered no; the store was never contacted.
    Declined,
}

/// Orchestrates session gating, the document list, both search scopes and
/// transfers. The only writer of registry and search state.
///
/// Operations are not serialized against each other. When two of them touch
/// the same state, whichever response resolves last is what remains.
pub struct WorkspaceController {
    session: Arc<SessionStore>,
    store: Arc<dyn DocumentStore>,
    confirm: Arc<dyn Confirm>,
    transfers: TransferManager,
    registry: DocumentRegistry,
    search: SearchCoordinator,
    policy: PolicyConfig,
    download_variant: DownloadVariant,
}

impl WorkspaceController {
    pub fn new(
        session: Arc<SessionStore>,
        store: Arc<dyn DocumentStore>,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self {
            transfers: TransferManager::new(Arc::clone(&store)),
            session,
            store,
            confirm,
            registry: DocumentRegistry::new(),
            search: SearchCoordinator::new(),
            policy: PolicyConfig::default(),
            download_variant: DownloadVariant::default(),
        }
    }

    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_download_variant(mut self, variant: DownloadVariant) -> Self {
        self.download_variant = variant;
        self
    }

    // ── Read side ───────────────────────────────────────────────

    pub fn session(&self) -> Option<Session> {
        self.session.current()
    }

    pub fn documents(&self) -> Vec<DocumentSummary> {
        self.registry.snapshot()
    }

    pub fn global_scope(&self) -> GlobalScope {
        self.search.global()
    }

    pub fn document_scope(&self, id: DocumentId) -> Option<DocumentScope> {
        self.search.scope(id)
    }

    pub fn document_scope_ids(&self) -> Vec<DocumentId> {
        self.search.document_ids()
    }

    /// Excerpts of a document's scope split into highlight segments for the
    /// scope's own query.
    pub fn highlighted_excerpts(&self, id: DocumentId) -> Vec<Vec<Segment>> {
        self.search
            .scope(id)
            .map(|scope| {
                scope
                    .excerpts()
                    .iter()
                    .map(|line| highlight(line, &scope.query))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn transfers(&self) -> Vec<TransferTask> {
        self.transfers.tasks()
    }

    // ── Operations ──────────────────────────────────────────────

    /// Replace the registry with the store's full collection and drop any
    /// global filter. On failure the registry keeps its previous contents.
    pub async fn list_documents(&self) -> WorkspaceResult<Vec<DocumentSummary>> {
        let session = self.session.require()?;
        let documents = self.guard(&session, self.store.list(&session.token).await)?;
        info!(count = documents.len(), "document list refreshed");
        self.registry.replace(documents);
        self.search.clear_global();
        Ok(self.registry.snapshot())
    }

    /// Upload a file owned by the signed-in user, then resynchronize the list.
    pub async fn upload(&self, bytes: Vec<u8>, filename: &str) -> WorkspaceResult<DocumentSummary> {
        let session = self.session.require()?;
        if filename.trim().is_empty() || bytes.is_empty() {
            return Err(WorkspaceError::Validation("no file selected".into()));
        }
        if !session.is_admin() && !self.policy.allow_user_upload {
            return Err(WorkspaceError::Unauthorized(format!(
                "role {} may not upload documents",
                session.role
            )));
        }

        let outcome = self
            .transfers
            .upload(&session.token, &session.user_id, filename.trim(), bytes)
            .await;
        let created = self.guard(&session, outcome)?;

        // The upload itself has landed remotely; a failed refresh only leaves
        // the list stale.
        if let Err(err) = self.list_documents().await {
            warn!(error = %err, "refresh after upload failed");
        }
        Ok(created)
    }

    /// Delete after an explicit yes from the confirmation gate.
    pub async fn delete(&self, id: DocumentId) -> WorkspaceResult<DeleteOutcome> {
        let session = self.session.require()?;
        if !session.is_admin() && !self.policy.allow_user_delete {
            return Err(WorkspaceError::Unauthorized(format!(
                "role {} may not delete documents",
                session.role
            )));
        }

        let label = self
            .registry
            .get(id)
            .map(|d| d.filename)
            .unwrap_or_else(|| format!("document {id}"));
        if !self.confirm.confirm(&format!("Delete {label}?")).await {
            return Ok(DeleteOutcome::Declined);
        }

        self.guard(&session, self.store.delete(&session.token, id).await)?;
        self.registry.replace(self.registry.without(id));
        self.search.remove(id);
        info!(%id, "document deleted");
        Ok(DeleteOutcome::Deleted)
    }

    /// Refresh the registry so later operations can name documents. A failure
    /// is logged and the registry keeps what it had.
    pub async fn refresh_quietly(&self) -> bool {
        match self.list_documents().await {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "document list unavailable; continuing without it");
                false
            }
        }
    }

    pub async fn download(&self, id: DocumentId) -> WorkspaceResult<FileArtifact> {
        let session = self.session.require()?;
        let known = self.registry.get(id).map(|d| d.filename);
        let outcome = self
            .transfers
            .download(&session.token, id, self.download_variant, known.as_deref())
            .await;
        self.guard(&session, outcome)
    }

    /// Global search. The empty query is a plain refresh; anything else,
    /// whitespace included, shows exactly what the store returns.
    pub async fn search(&self, query: &str) -> WorkspaceResult<Vec<DocumentSummary>> {
        let session = self.session.require()?;
        if query.is_empty() {
            return self.list_documents().await;
        }
        let results = self.guard(&session, self.store.search(&session.token, query).await)?;
        info!(query, count = results.len(), "global search applied");
        self.registry.replace(results);
        self.search.set_global(query);
        Ok(self.registry.snapshot())
    }

    /// Search one document's extracted text; matching lines land in that
    /// document's scope.
    pub async fn search_within_document(
        &self,
        id: DocumentId,
        query: &str,
    ) -> WorkspaceResult<Vec<String>> {
        let session = self.session.require()?;
        if query.trim().is_empty() {
            return Err(WorkspaceError::Validation(
                "search keyword must not be empty".into(),
            ));
        }

        self.search.begin(id, query);
        let outcome = self.guard(
            &session,
            self.store.search_in_document(&session.token, id, query).await,
        );
        self.search.resolve(id, query, &outcome);
        outcome
    }

    pub fn viewer_url(&self, id: DocumentId, query: Option<&str>) -> WorkspaceResult<String> {
        self.session.require()?;
        Ok(self.store.viewer_url(id, query))
    }

    /// End the session and forget everything it showed.
    pub fn logout(&self) {
        self.session.sign_out();
        self.registry.replace(Vec::new());
        self.search.reset();
        self.transfers.clear();
        info!("signed out");
    }

    /// A remote `Unauthorized` ends the session that made the request.
    fn guard<T>(&self, session: &Session, result: WorkspaceResult<T>) -> WorkspaceResult<T> {
        if let Err(err) = &result {
            if err.is_unauthorized() {
                self.session.revoke(&session.token);
            }
        }
        result
    }
}
