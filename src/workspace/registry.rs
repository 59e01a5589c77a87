use super::schema::{DocumentId, DocumentSummary};
use parking_lot::RwLock;

/// In-memory mirror of the remote collection, in the order the store
/// returned it. Every refresh is a whole-list swap.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    documents: RwLock<Vec<DocumentSummary>>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<DocumentSummary> {
        self.documents.read().clone()
    }

    /// Atomically replace the visible list.
    pub fn replace(&self, documents: Vec<DocumentSummary>) {
        *self.documents.write() = documents;
    }

    pub fn get(&self, id: DocumentId) -> Option<DocumentSummary> {
        self.documents.read().iter().find(|d| d.id == id).cloned()
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.documents.read().iter().any(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Current contents minus `id`, ready to be passed back to [`replace`].
    ///
    /// [`replace`]: Self::replace
    pub fn without(&self, id: DocumentId) -> Vec<DocumentSummary> {
        self.documents
            .read()
            .iter()
            .filter(|d| d.id != id)
            .cloned()
            .collect()
    }
}
