//! Document stores that accept operation logs.
//!
//! [`DocumentStore`] is the seam between a [`SyncSession`](crate::SyncSession)
//! and whatever holds the authoritative documents. [`InMemoryDocumentStore`]
//! keeps documents in a `HashMap` behind a `RwLock` and is what the tests and
//! the CLI use.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use docsync_ops::{apply_document, OperationLog};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{SessionError, SessionResult};

/// A stored document: an identifier plus its JSON contents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub contents: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, contents: Value) -> Self {
        Self {
            id: id.into(),
            contents,
        }
    }

    /// Top-level field of the document, if the contents are an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.contents.get(key)
    }
}

/// Backend holding authoritative documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the current state of a document.
    async fn load_document(&self, id: &str) -> SessionResult<Document>;

    /// Apply `log` to a document and return its post-sync state.
    async fn sync_document(&self, id: &str, log: &OperationLog) -> SessionResult<Document>;
}

/// An in-memory implementation of [`DocumentStore`].
///
/// Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, Value>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a document.
    pub fn insert_document(&self, id: impl Into<String>, contents: Value) -> SessionResult<()> {
        let mut documents = self
            .documents
            .write()
            .map_err(|e| SessionError::Store(format!("lock poisoned: {e}")))?;
        documents.insert(id.into(), contents);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn load_document(&self, id: &str) -> SessionResult<Document> {
        let documents = self
            .documents
            .read()
            .map_err(|e| SessionError::Store(format!("lock poisoned: {e}")))?;
        let contents = documents
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::DocumentNotFound(id.to_string()))?;
        Ok(Document::new(id, contents))
    }

    async fn sync_document(&self, id: &str, log: &OperationLog) -> SessionResult<Document> {
        let mut documents = self
            .documents
            .write()
            .map_err(|e| SessionError::Store(format!("lock poisoned: {e}")))?;
        let current = documents
            .get(id)
            .ok_or_else(|| SessionError::DocumentNotFound(id.to_string()))?;

        // A log that fails to apply leaves the stored document untouched.
        let updated = apply_document(current, log.operations())?;
        documents.insert(id.to_string(), updated.clone());
        debug!(document = id, operations = log.len(), "synced document");
        Ok(Document::new(id, updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsync_ops::Operation;
    use serde_json::json;

    #[tokio::test]
    async fn load_missing_document() {
        let store = InMemoryDocumentStore::new();
        match store.load_document("nope").await {
            Err(SessionError::DocumentNotFound(id)) => assert_eq!(id, "nope"),
            other => panic!("expected DocumentNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn load_returns_inserted_contents() {
        let store = InMemoryDocumentStore::new();
        store.insert_document("d1", json!({"doc": {"a": 1}})).unwrap();
        assert_eq!(store.len(), 1);

        let doc = store.load_document("d1").await.unwrap();
        assert_eq!(doc.id, "d1");
        assert_eq!(doc.get("doc"), Some(&json!({"a": 1})));
        assert_eq!(doc.get("other"), None);
    }

    #[tokio::test]
    async fn sync_applies_log() {
        let store = InMemoryDocumentStore::new();
        store
            .insert_document("d1", json!({"doc": {"a": 1, "s": "hello"}, "meta": true}))
            .unwrap();

        let log = OperationLog::from(vec![
            Operation::Replace {
                path: "doc/a".into(),
                value: json!(2),
            },
            Operation::StringRemove {
                path: "doc/s".into(),
                index: 3,
                length: 2,
            },
            Operation::StringInsert {
                path: "doc/s".into(),
                index: 3,
                text: "p".into(),
            },
        ]);
        let doc = store.sync_document("d1", &log).await.unwrap();
        assert_eq!(doc.contents, json!({"doc": {"a": 2, "s": "help"}, "meta": true}));

        let reloaded = store.load_document("d1").await.unwrap();
        assert_eq!(reloaded, doc);
    }

    #[tokio::test]
    async fn failed_sync_leaves_document_untouched() {
        let store = InMemoryDocumentStore::new();
        store.insert_document("d1", json!({"doc": {"a": 1}})).unwrap();

        let log = OperationLog::from(vec![Operation::Delete {
            path: "doc/missing/deeper".into(),
        }]);
        match store.sync_document("d1", &log).await {
            Err(SessionError::Apply(_)) => {}
            other => panic!("expected Apply error, got {:?}", other),
        }
        let doc = store.load_document("d1").await.unwrap();
        assert_eq!(doc.contents, json!({"doc": {"a": 1}}));
    }
}
