//! Error types for the rating repository.
//! Consolidates and re-exports error types related to vote and content storage.
mod rating;

pub use rating::RatingRepositoryError;
