//! Error types for the delta crate.

/// Errors that can occur while building or ingesting deltas.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The delta's tag is inconsistent with its payload shape.
    #[error("malformed delta at '{location}': {reason}")]
    MalformedDelta { location: String, reason: String },

    /// Array move detection was requested; moves are never reported.
    #[error("array move detection is not supported")]
    MoveDetectionUnsupported,
}

impl DiffError {
    pub(crate) fn malformed(location: &str, reason: impl Into<String>) -> Self {
        let location = if location.is_empty() { "/" } else { location };
        Self::MalformedDelta {
            location: location.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for delta results.
pub type DiffResult<T> = Result<T, DiffError>;
