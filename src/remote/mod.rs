//! Contract of the remote document store.

pub mod http;

pub use http::HttpDocumentStore;

use crate::config::DownloadVariant;
use crate::error::WorkspaceResult;
use crate::workspace::schema::{DocumentId, DocumentSummary};
use async_trait::async_trait;

/// File types the upload picker offers. Advisory only; nothing is rejected
/// client-side on the basis of type.
pub const ACCEPT_HINT: &str = ".pdf,.doc,.docx";

/// Bytes of a file to upload plus the owner it is filed under.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub mime_type: String,
    pub owner_id: String,
    pub bytes: Vec<u8>,
}

/// A downloaded body and the headers needed to name it.
#[derive(Debug, Clone, Default)]
pub struct RemoteFile {
    pub bytes: Vec<u8>,
    pub content_disposition: Option<String>,
    pub content_type: Option<String>,
}

/// Every call carries the session's bearer token. Filtering, text search
/// and role enforcement all happen on the other side.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(&self, token: &str) -> WorkspaceResult<Vec<DocumentSummary>>;

    async fn search(&self, token: &str, keyword: &str) -> WorkspaceResult<Vec<DocumentSummary>>;

    async fn upload(&self, token: &str, request: UploadRequest)
        -> WorkspaceResult<DocumentSummary>;

    /// A second delete of the same id fails with `NotFound`.
    async fn delete(&self, token: &str, id: DocumentId) -> WorkspaceResult<()>;

    async fn fetch(
        &self,
        token: &str,
        id: DocumentId,
        variant: DownloadVariant,
    ) -> WorkspaceResult<RemoteFile>;

    /// Lines of the document's extracted text containing `keyword`.
    async fn search_in_document(
        &self,
        token: &str,
        id: DocumentId,
        keyword: &str,
    ) -> WorkspaceResult<Vec<String>>;

    /// Address of the raw file for an external viewer, optionally with an
    /// in-viewer search fragment.
    fn viewer_url(&self, id: DocumentId, query: Option<&str>) -> String;
}

/// MIME type for an upload part, from the file extension.
pub fn guess_mime_type(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
