//! The shadow-document sync session.

use std::sync::Arc;

use docsync_delta::{Differ, DifferConfig};
use docsync_ops::{translate, OperationLog};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{SessionError, SessionResult};
use crate::store::{Document, DocumentStore};

/// Keeps one field of one stored document in sync with a local value.
///
/// The session remembers the last value known to match the store (the
/// shadow). Each sync sends only the operations that turn the shadow into
/// the caller's current value, addressed under `object_key`.
pub struct SyncSession<S: DocumentStore> {
    store: Arc<S>,
    document_id: String,
    object_key: String,
    differ: Differ,
    shadow: Option<Value>,
}

impl<S: DocumentStore> SyncSession<S> {
    pub fn new(
        store: Arc<S>,
        document_id: impl Into<String>,
        object_key: impl Into<String>,
        config: DifferConfig,
    ) -> SessionResult<Self> {
        Ok(Self {
            store,
            document_id: document_id.into(),
            object_key: object_key.into(),
            differ: Differ::new(config)?,
            shadow: None,
        })
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn object_key(&self) -> &str {
        &self.object_key
    }

    pub fn is_loaded(&self) -> bool {
        self.shadow.is_some()
    }

    /// The last value known to be in sync with the store.
    pub fn shadow(&self) -> Option<&Value> {
        self.shadow.as_ref()
    }

    /// Fetch the document and cache its field as the new shadow.
    pub async fn load(&mut self) -> SessionResult<Value> {
        let document = self.store.load_document(&self.document_id).await?;
        let value = self.field_of(&document)?;
        info!(document = %self.document_id, field = %self.object_key, "loaded document");
        self.shadow = Some(value.clone());
        Ok(value)
    }

    /// Operations turning the shadow into `current`.
    pub fn diff(&self, current: &Value) -> SessionResult<OperationLog> {
        let shadow = self.shadow.as_ref().ok_or(SessionError::NotLoaded("diffed"))?;
        let delta = self.differ.diff(shadow, current);
        Ok(translate(&delta, &self.object_key)?)
    }

    /// Submit the changes from the shadow to `current` and adopt the
    /// store's post-sync value as the new shadow.
    ///
    /// Nothing is submitted if translation fails.
    pub async fn sync(&mut self, current: &Value) -> SessionResult<Value> {
        if self.shadow.is_none() {
            return Err(SessionError::NotLoaded("synced"));
        }
        let log = self.diff(current)?;
        debug!(
            document = %self.document_id,
            operations = log.len(),
            splices = log.splices(),
            "submitting operation log"
        );

        let document = self.store.sync_document(&self.document_id, &log).await?;
        let value = self.field_of(&document)?;
        info!(document = %self.document_id, operations = log.len(), "synced document");
        self.shadow = Some(value.clone());
        Ok(value)
    }

    fn field_of(&self, document: &Document) -> SessionResult<Value> {
        document
            .get(&self.object_key)
            .cloned()
            .ok_or_else(|| SessionError::MissingField {
                document: self.document_id.clone(),
                field: self.object_key.clone(),
            })
    }
}
