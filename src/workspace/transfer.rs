//! Upload and download against the remote store, and conversion of response
//! bodies into named file artifacts.

use super::schema::{DocumentId, DocumentSummary};
use crate::config::DownloadVariant;
use crate::error::WorkspaceResult;
use crate::remote::{guess_mime_type, DocumentStore, RemoteFile, UploadRequest};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use tokio::fs;
use tracing::{debug, info};

static EXTENDED_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\*\s*=\s*(?:utf-8|iso-8859-1)?'[^']*'([^;]+)"#)
        .expect("extended filename pattern")
});
static PLAIN_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)filename\s*=\s*"?([^";]+)"?"#).expect("filename pattern"));

/// Most transfer records kept; the oldest finished ones go first.
pub const TASK_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Upload,
    Download,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Pending,
    Succeeded,
    Failed,
}

/// Record of one transfer. The payload itself is never kept; only its size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTask {
    pub id: u64,
    pub kind: TransferKind,
    pub document_id: Option<DocumentId>,
    pub filename: String,
    pub bytes: usize,
    pub status: TransferStatus,
}

/// A downloaded document ready to be written somewhere by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArtifact {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileArtifact {
    /// Write into `dir` under the artifact's name, returning the full path.
    pub async fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .await
            .context("Failed to create output directory")?;
        let path = dir.join(&self.filename);
        fs::write(&path, &self.bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

pub struct TransferManager {
    store: Arc<dyn DocumentStore>,
    tasks: Mutex<Vec<TransferTask>>,
    next_id: AtomicU64,
}

impl TransferManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            tasks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn tasks(&self) -> Vec<TransferTask> {
        self.tasks.lock().clone()
    }

    pub fn clear(&self) {
        self.tasks.lock().clear();
    }

    pub async fn upload(
        &self,
        token: &str,
        owner_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> WorkspaceResult<DocumentSummary> {
        let task = self.start(TransferKind::Upload, None, filename, bytes.len());
        let request = UploadRequest {
            filename: filename.to_string(),
            mime_type: guess_mime_type(filename).to_string(),
            owner_id: owner_id.to_string(),
            bytes,
        };
        let outcome = self.store.upload(token, request).await;
        self.finish(task, outcome.is_ok());
        if let Ok(created) = &outcome {
            info!(id = %created.id, filename = %created.filename, "upload complete");
        }
        outcome
    }

    /// Fetch a document body and name it. `known_filename` is the registry's
    /// name for the document, used when the response carries no usable
    /// `Content-Disposition`.
    pub async fn download(
        &self,
        token: &str,
        id: DocumentId,
        variant: DownloadVariant,
        known_filename: Option<&str>,
    ) -> WorkspaceResult<FileArtifact> {
        let fallback = default_download_name(id, variant, known_filename);
        let task = self.start(TransferKind::Download, Some(id), &fallback, 0);
        match self.store.fetch(token, id, variant).await {
            Ok(remote) => {
                let artifact = into_artifact(remote, fallback);
                self.set_size(task, artifact.bytes.len());
                self.finish(task, true);
                debug!(%id, filename = %artifact.filename, bytes = artifact.bytes.len(), "download complete");
                Ok(artifact)
            }
            Err(err) => {
                self.finish(task, false);
                Err(err)
            }
        }
    }

    fn start(
        &self,
        kind: TransferKind,
        document_id: Option<DocumentId>,
        filename: &str,
        bytes: usize,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut tasks = self.tasks.lock();
        if tasks.len() >= TASK_HISTORY_LIMIT {
            if let Some(oldest) = tasks.iter().position(|t| t.status != TransferStatus::Pending) {
                tasks.remove(oldest);
            }
        }
        tasks.push(TransferTask {
            id,
            kind,
            document_id,
            filename: filename.to_string(),
            bytes,
            status: TransferStatus::Pending,
        });
        id
    }

    fn set_size(&self, task: u64, bytes: usize) {
        if let Some(t) = self.tasks.lock().iter_mut().find(|t| t.id == task) {
            t.bytes = bytes;
        }
    }

    fn finish(&self, task: u64, succeeded: bool) {
        if let Some(t) = self.tasks.lock().iter_mut().find(|t| t.id == task) {
            t.status = if succeeded {
                TransferStatus::Succeeded
            } else {
                TransferStatus::Failed
            };
        }
    }
}

fn into_artifact(remote: RemoteFile, fallback: String) -> FileArtifact {
    let filename = remote
        .content_disposition
        .as_deref()
        .and_then(filename_from_disposition)
        .unwrap_or(fallback);
    FileArtifact {
        filename,
        content_type: remote.content_type,
        bytes: remote.bytes,
    }
}

/// Name to save a download under when the response does not supply one.
pub fn default_download_name(
    id: DocumentId,
    variant: DownloadVariant,
    known_filename: Option<&str>,
) -> String {
    let base = known_filename
        .map(sanitize_filename)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("document-{id}"));
    match variant {
        DownloadVariant::Derived => format!("{base}.txt"),
        DownloadVariant::Raw => base,
    }
}

/// Filename from a `Content-Disposition` header, preferring the RFC 5987
/// `filename*` form. Directory components are stripped.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let extended = EXTENDED_FILENAME
        .captures(header)
        .and_then(|c| c.get(1))
        .and_then(|m| urlencoding::decode(m.as_str().trim()).ok())
        .map(|s| s.into_owned());
    let plain = || {
        PLAIN_FILENAME
            .captures(header)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    };
    extended
        .or_else(plain)
        .map(|name| sanitize_filename(&name))
        .filter(|name| !name.is_empty())
}

fn sanitize_filename(name: &str) -> String {
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    match name {
        "." | ".." => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_quoted_and_bare() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="report.pdf.txt""#),
            Some("report.pdf.txt".into())
        );
        assert_eq!(
            filename_from_disposition("inline; filename=scan.pdf"),
            Some("scan.pdf".into())
        );
        assert_eq!(filename_from_disposition("attachment"), None);
    }

    #[test]
    fn disposition_prefers_extended_form() {
        let header = r#"attachment; filename="fallback.txt"; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"#;
        assert_eq!(filename_from_disposition(header), Some("résumé.pdf".into()));
    }

    #[test]
    fn disposition_strips_directories() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="../../etc/passwd""#),
            Some("passwd".into())
        );
        assert_eq!(filename_from_disposition(r#"attachment; filename="..""#), None);
    }

    #[test]
    fn default_names_follow_variant() {
        let id = DocumentId(12);
        assert_eq!(
            default_download_name(id, DownloadVariant::Derived, Some("report.pdf")),
            "report.pdf.txt"
        );
        assert_eq!(
            default_download_name(id, DownloadVariant::Raw, Some("report.pdf")),
            "report.pdf"
        );
        assert_eq!(
            default_download_name(id, DownloadVariant::Derived, None),
            "document-12.txt"
        );
        assert_eq!(default_download_name(id, DownloadVariant::Raw, None), "document-12");
    }

    #[test]
    fn artifact_falls_back_without_header() {
        let remote = RemoteFile {
            bytes: b"hello".to_vec(),
            content_disposition: None,
            content_type: Some("text/plain".into()),
        };
        let artifact = into_artifact(remote, "x.txt".into());
        assert_eq!(artifact.filename, "x.txt");
        assert_eq!(artifact.bytes, b"hello");
    }

    #[tokio::test]
    async fn artifact_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = FileArtifact {
            filename: "out.txt".into(),
            content_type: None,
            bytes: b"extracted".to_vec(),
        };
        let path = artifact.save(&dir.path().join("downloads")).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"extracted");
    }
}
