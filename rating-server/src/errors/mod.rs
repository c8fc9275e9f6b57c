//! Error types for the Rating Server application.
//! Consolidates failures that can stop the server from starting or serving,
//! such as bad configuration or an unreachable database.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Repository error: {0}")]
    Repository(#[from] rating_repository::RatingRepositoryError),
    #[error("Auth error: {0}")]
    Auth(#[from] rating_engine::AuthError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
