//! Error types for the content service.
use rating_repository::RatingRepositoryError;
use rating_shared::types::ItemId;
use thiserror::Error;

/// Represents errors that can occur while managing writeups.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Caller is not authenticated")]
    Unauthenticated,

    #[error("Caller is not allowed to manage writeups")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Writeup not found: {0}")]
    NotFound(ItemId),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Repository error: {0}")]
    Repository(RatingRepositoryError),
}

impl ContentError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// A short message suitable for showing to the caller.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthenticated => "Sign in to manage writeups.".to_string(),
            Self::Forbidden => "Only administrators can manage writeups.".to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::NotFound(_) => "This writeup no longer exists.".to_string(),
            Self::StorageUnavailable(_) => {
                "Writeups are temporarily unavailable. Please try again.".to_string()
            }
            Self::Repository(_) => "The request could not be completed.".to_string(),
        }
    }
}

impl From<RatingRepositoryError> for ContentError {
    fn from(err: RatingRepositoryError) -> Self {
        match err {
            RatingRepositoryError::Unavailable(msg) => Self::StorageUnavailable(msg),
            RatingRepositoryError::ItemNotFound(id) => Self::NotFound(id),
            other => Self::Repository(other),
        }
    }
}
