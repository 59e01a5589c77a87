//! Client-side document workspace.
//!
//! Mirrors the remote collection, runs global and per-document searches,
//! and moves files in and out of the store on behalf of one session.

pub mod confirm;
pub mod controller;
pub mod registry;
pub mod schema;
pub mod search;
pub mod transfer;

pub use confirm::{Confirm, StaticConfirm};
pub use controller::{DeleteOutcome, WorkspaceController};
pub use registry::DocumentRegistry;
pub use schema::{DocumentId, DocumentSummary};
pub use search::{highlight, DocumentScope, GlobalScope, ScopeState, SearchCoordinator, Segment};
pub use transfer::{
    FileArtifact, TransferKind, TransferManager, TransferStatus, TransferTask, TASK_HISTORY_LIMIT,
};
