use super::{DocumentStore, RemoteFile, UploadRequest};
use crate::config::{Config, DownloadVariant};
use crate::error::{classify_status, WorkspaceResult};
use crate::workspace::schema::{DocumentId, DocumentSummary};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// [`DocumentStore`] over the store's REST surface at `<base>/api/documents`.
pub struct HttpDocumentStore {
    client: Client,
    base_url: String,
}

impl HttpDocumentStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> WorkspaceResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> WorkspaceResult<Self> {
        Self::new(
            config.documents_url(),
            Duration::from_secs(config.server.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Pass 2xx responses through; turn anything else into a classified error.
pub(crate) async fn ensure_success(response: Response) -> WorkspaceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status, &body))
}

fn header_value(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn list(&self, token: &str) -> WorkspaceResult<Vec<DocumentSummary>> {
        debug!(url = %self.base_url, "listing documents");
        let response = self.client.get(&self.base_url).bearer_auth(token).send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn search(&self, token: &str, keyword: &str) -> WorkspaceResult<Vec<DocumentSummary>> {
        debug!(keyword, "searching documents");
        let response = self
            .client
            .get(self.url("/search"))
            .bearer_auth(token)
            .query(&[("keyword", keyword)])
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn upload(
        &self,
        token: &str,
        request: UploadRequest,
    ) -> WorkspaceResult<DocumentSummary> {
        debug!(filename = %request.filename, bytes = request.bytes.len(), "uploading document");
        let part = Part::bytes(request.bytes)
            .file_name(request.filename)
            .mime_str(&request.mime_type)?;
        let form = Form::new()
            .part("file", part)
            .text("ownerId", request.owner_id);
        let response = self
            .client
            .post(self.url("/upload"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn delete(&self, token: &str, id: DocumentId) -> WorkspaceResult<()> {
        debug!(%id, "deleting document");
        let response = self
            .client
            .delete(self.url(&format!("/{id}")))
            .bearer_auth(token)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn fetch(
        &self,
        token: &str,
        id: DocumentId,
        variant: DownloadVariant,
    ) -> WorkspaceResult<RemoteFile> {
        let path = match variant {
            DownloadVariant::Derived => format!("/{id}/download"),
            DownloadVariant::Raw => format!("/{id}/file"),
        };
        debug!(%id, ?variant, "fetching document body");
        let response = self.client.get(self.url(&path)).bearer_auth(token).send().await?;
        let response = ensure_success(response).await?;
        let content_disposition = header_value(response.headers(), CONTENT_DISPOSITION);
        let content_type = header_value(response.headers(), CONTENT_TYPE);
        let bytes = response.bytes().await?.to_vec();
        Ok(RemoteFile {
            bytes,
            content_disposition,
            content_type,
        })
    }

    async fn search_in_document(
        &self,
        token: &str,
        id: DocumentId,
        keyword: &str,
    ) -> WorkspaceResult<Vec<String>> {
        debug!(%id, keyword, "searching inside document");
        let response = self
            .client
            .get(self.url(&format!("/{id}/search")))
            .bearer_auth(token)
            .query(&[("keyword", keyword)])
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    fn viewer_url(&self, id: DocumentId, query: Option<&str>) -> String {
        let url = self.url(&format!("/{id}/file"));
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => format!("{url}#search={}", urlencoding::encode(q)),
            None => url,
        }
    }
}
