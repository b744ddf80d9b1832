//! Error types for change resolution.

use thiserror::Error;

/// Main error type for feed operations.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Unknown replication filter: {0}")]
    UnknownFilter(String),

    #[error("Invalid filter parameter '{key}': {reason}")]
    InvalidParameters { key: String, reason: String },

    #[error("Unresolved term uuids: {}", .0.join(", "))]
    UnresolvedTerms(Vec<String>),

    #[error("Failed to load {entity_type} {id}: {reason}")]
    Load {
        entity_type: String,
        id: String,
        reason: String,
    },

    #[error("Normalization error: {0}")]
    Normalization(String),

    #[error("Resolution cancelled")]
    Cancelled,
}

impl FeedError {
    /// Build an invalid parameter error.
    pub fn invalid_parameter(key: impl Into<String>, reason: impl Into<String>) -> Self {
        FeedError::InvalidParameters {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error comes from filter configuration (unknown id or bad parameters).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FeedError::UnknownFilter(_) | FeedError::InvalidParameters { .. }
        )
    }

    /// Whether this error is a term validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, FeedError::UnresolvedTerms(_))
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::Normalization(e.to_string())
    }
}

/// Result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;
