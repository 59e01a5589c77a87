//! Client workspace for a remote PDF/DOC document store.
//!
//! A [`workspace::WorkspaceController`] holds one session's view of the
//! store: the document list, a global search filter, per-document in-text
//! searches and file transfers. The store and the user service sit behind
//! the [`remote::DocumentStore`] and [`auth::AuthService`] traits.

pub mod auth;
pub mod config;
pub mod error;
pub mod remote;
pub mod session;
pub mod workspace;

pub use config::Config;
pub use error::{ErrorKind, WorkspaceError, WorkspaceResult};
pub use session::{Role, Session, SessionStore};
pub use workspace::WorkspaceController;
