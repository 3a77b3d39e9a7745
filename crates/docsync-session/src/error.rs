use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("document must be loaded before it can be {0}")]
    NotLoaded(&'static str),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("document {document} has no field {field:?}")]
    MissingField { document: String, field: String },

    #[error("store error: {0}")]
    Store(String),

    #[error("diff error: {0}")]
    Diff(#[from] docsync_delta::DiffError),

    #[error("translation error: {0}")]
    Translate(#[from] docsync_ops::TranslateError),

    #[error("apply error: {0}")]
    Apply(#[from] docsync_ops::ApplyError),
}

pub type SessionResult<T> = Result<T, SessionError>;
