//! Error types for translation and operation replay.

use docsync_delta::DiffError;

/// Fatal translation failures. No partial operation log survives one.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// The delta's tag does not fit where it appears.
    #[error("malformed delta: {0}")]
    MalformedDelta(String),

    /// A child was left with an empty path stack.
    #[error("path stack underflow: leave_child called at the root")]
    StackUnderflow,

    /// The walk finished with children still entered.
    #[error("path stack not empty after translation (depth {depth})")]
    UnbalancedStack { depth: usize },

    /// The wire-format delta could not be decoded.
    #[error(transparent)]
    Delta(#[from] DiffError),
}

/// Convenience alias for translation results.
pub type TranslateResult<T> = Result<T, TranslateError>;

/// Errors from interpreting an operation log against a document.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("path {path:?} is outside base pointer {base:?}")]
    OutsideBase { path: String, base: String },

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("type mismatch at {path}: expected {expected}")]
    TypeMismatch { path: String, expected: &'static str },

    #[error("index {index} out of range at {path} (length {len})")]
    IndexOutOfRange { path: String, index: usize, len: usize },

    #[error("conflicting operations at {0}")]
    Conflict(String),

    #[error("{op} cannot target the base pointer itself")]
    InvalidRoot { op: &'static str },
}

/// Convenience alias for apply results.
pub type ApplyResult<T> = Result<T, ApplyError>;
