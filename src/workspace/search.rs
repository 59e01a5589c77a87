//! Global and per-document search scopes, plus match highlighting.

use super::schema::DocumentId;
use crate::error::WorkspaceError;
use parking_lot::RwLock;
use std::collections::HashMap;

/// The global filter over the document list. Its results live in the
/// registry itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GlobalScope {
    #[default]
    Unfiltered,
    Filtered {
        query: String,
    },
}

impl GlobalScope {
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Unfiltered => None,
            Self::Filtered { query } => Some(query),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeState {
    Idle,
    Searching,
    Populated(Vec<String>),
    Empty,
    Failed(String),
}

/// The latest query against one document and where it stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentScope {
    pub query: String,
    pub state: ScopeState,
}

impl DocumentScope {
    pub fn excerpts(&self) -> &[String] {
        match &self.state {
            ScopeState::Populated(lines) => lines,
            _ => &[],
        }
    }
}

#[derive(Debug, Default)]
struct Scopes {
    global: GlobalScope,
    documents: HashMap<DocumentId, DocumentScope>,
}

/// Owns both search scopes. Writes come only from the workspace controller;
/// the accessors here are read-only.
#[derive(Debug, Default)]
pub struct SearchCoordinator {
    inner: RwLock<Scopes>,
}

impl SearchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global(&self) -> GlobalScope {
        self.inner.read().global.clone()
    }

    pub fn scope(&self, id: DocumentId) -> Option<DocumentScope> {
        self.inner.read().documents.get(&id).cloned()
    }

    pub fn state(&self, id: DocumentId) -> ScopeState {
        self.scope(id).map(|s| s.state).unwrap_or(ScopeState::Idle)
    }

    /// Ids with a per-document scope, ascending.
    pub fn document_ids(&self) -> Vec<DocumentId> {
        let mut ids: Vec<DocumentId> = self.inner.read().documents.keys().copied().collect();
        ids.sort();
        ids
    }

    pub(crate) fn set_global(&self, query: &str) {
        self.inner.write().global = GlobalScope::Filtered {
            query: query.to_string(),
        };
    }

    pub(crate) fn clear_global(&self) {
        self.inner.write().global = GlobalScope::Unfiltered;
    }

    /// Move a scope to `Searching`, discarding whatever it held.
    pub(crate) fn begin(&self, id: DocumentId, query: &str) {
        self.inner.write().documents.insert(
            id,
            DocumentScope {
                query: query.to_string(),
                state: ScopeState::Searching,
            },
        );
    }

    /// Record a response. Whichever response resolves last owns the scope,
    /// even if its request was issued first.
    pub(crate) fn resolve(
        &self,
        id: DocumentId,
        query: &str,
        outcome: &Result<Vec<String>, WorkspaceError>,
    ) {
        let state = match outcome {
            Ok(lines) if lines.is_empty() => ScopeState::Empty,
            Ok(lines) => ScopeState::Populated(lines.clone()),
            Err(err) => ScopeState::Failed(err.to_string()),
        };
        self.inner.write().documents.insert(
            id,
            DocumentScope {
                query: query.to_string(),
                state,
            },
        );
    }

    pub(crate) fn remove(&self, id: DocumentId) -> Option<DocumentScope> {
        self.inner.write().documents.remove(&id)
    }

    pub(crate) fn reset(&self) {
        *self.inner.write() = Scopes::default();
    }
}

/// A run of excerpt text, flagged if it matched the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub is_match: bool,
}

impl Segment {
    fn new(text: &str, is_match: bool) -> Self {
        Self {
            text: text.to_string(),
            is_match,
        }
    }
}

/// Split `text` into matching and non-matching runs of `query`,
/// case-insensitively, keeping the original casing of `text`.
pub fn highlight(text: &str, query: &str) -> Vec<Segment> {
    let needle: Vec<char> = query.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return if text.is_empty() {
            Vec::new()
        } else {
            vec![Segment::new(text, false)]
        };
    }

    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut cursor = 0;
    while cursor < text.len() {
        if let Some(end) = match_at(text, cursor, &needle) {
            if plain_start < cursor {
                segments.push(Segment::new(&text[plain_start..cursor], false));
            }
            segments.push(Segment::new(&text[cursor..end], true));
            cursor = end;
            plain_start = end;
        } else {
            cursor += text[cursor..].chars().next().map_or(1, char::len_utf8);
        }
    }
    if plain_start < text.len() {
        segments.push(Segment::new(&text[plain_start..], false));
    }
    segments
}

/// Byte offset just past a case-insensitive match of `needle` starting at
/// `start`, if one exists and ends on a char boundary.
fn match_at(text: &str, start: usize, needle: &[char]) -> Option<usize> {
    let mut matched = 0;
    for (offset, ch) in text[start..].char_indices() {
        for lower in ch.to_lowercase() {
            if matched == needle.len() || needle[matched] != lower {
                return None;
            }
            matched += 1;
        }
        if matched == needle.len() {
            return Some(start + offset + ch.len_utf8());
        }
    }
    None
}
