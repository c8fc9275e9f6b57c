//! Error types for caller authentication.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Malformed token entry: {0}")]
    MalformedEntry(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Duplicate token for voter: {0}")]
    DuplicateToken(String),

    #[error("Authentication provider unavailable: {0}")]
    Unavailable(String),
}
