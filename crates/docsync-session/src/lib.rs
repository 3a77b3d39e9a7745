//! Shadow-document synchronization for docsync.
//!
//! A [`SyncSession`] keeps a local copy of the last document state known to
//! be in sync with a [`DocumentStore`]. Syncing diffs the caller's current
//! value against that shadow, submits the translated operation log, and
//! refreshes the shadow from the store's reply.

pub mod error;
pub mod session;
pub mod store;

pub use error::{SessionError, SessionResult};
pub use session::SyncSession;
pub use store::{Document, DocumentStore, InMemoryDocumentStore};
