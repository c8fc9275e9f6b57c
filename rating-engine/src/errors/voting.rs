//! Error types for the voting service.
use rating_repository::RatingRepositoryError;
use rating_shared::types::ItemId;
use thiserror::Error;

/// Represents errors that can occur while casting or reading votes.
///
/// Every variant leaves the stored votes and ratings exactly as they were
/// before the failed call.
#[derive(Debug, Error)]
pub enum VotingError {
    #[error("Caller is not authenticated")]
    Unauthenticated,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Vote could not be applied after {attempts} conflicting attempts")]
    ConflictRetryExhausted { attempts: usize },

    #[error("Repository error: {0}")]
    Repository(RatingRepositoryError),
}

impl VotingError {
    /// A short message suitable for showing to the voter.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "Sign in to vote.",
            Self::StorageUnavailable(_) => "Voting is temporarily unavailable. Please try again.",
            Self::ItemNotFound(_) => "This writeup no longer exists.",
            Self::ConflictRetryExhausted { .. } => "Too many votes at once. Please try again.",
            Self::Repository(_) => "Your vote could not be recorded.",
        }
    }
}

impl From<RatingRepositoryError> for VotingError {
    fn from(err: RatingRepositoryError) -> Self {
        match err {
            RatingRepositoryError::Unavailable(msg) => Self::StorageUnavailable(msg),
            RatingRepositoryError::ItemNotFound(id) => Self::ItemNotFound(id),
            other => Self::Repository(other),
        }
    }
}
