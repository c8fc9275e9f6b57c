//! Error types for the rating repository.
//! Defines specific errors that can occur during storage operations on votes,
//! ratings and writeups.
use rating_shared::types::ItemId;
use thiserror::Error;

/// Represents errors that can occur within the rating repository.
///
/// Raw `sqlx` errors are classified on conversion: serialization failures and
/// deadlocks become `Conflict`, connectivity problems become `Unavailable`.
#[derive(Debug, Error)]
pub enum RatingRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Invalid vote value: {0}")]
    InvalidVoteValue(i16),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(u64),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl RatingRepositoryError {
    /// Create an unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

// SQLSTATE serialization_failure and deadlock_detected
const CONFLICT_CODES: [&str; 2] = ["40001", "40P01"];

fn is_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| CONFLICT_CODES.contains(&code.as_ref())),
        _ => false,
    }
}

fn is_unavailable(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

impl From<sqlx::Error> for RatingRepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if is_conflict(&err) {
            return Self::Conflict(err.to_string());
        }
        if is_unavailable(&err) {
            return Self::Unavailable(err.to_string());
        }
        Self::DatabaseError(err)
    }
}
