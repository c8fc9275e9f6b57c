//! # Rating Engine
//! This crate holds the business rules of the writeup rating system.
//! It includes the vote transition table, the voting service that applies
//! transitions atomically against a repository, authentication of callers,
//! and the admin-guarded content service, along with error handling.
pub mod auth;
pub mod content;
pub mod service;
pub mod transition;

pub mod errors;

pub use auth::{AuthProvider, StaticTokenAuthProvider};
pub use content::{ContentService, DEFAULT_TOP_WRITEUPS};
pub use errors::{AuthError, ContentError, VotingError};
pub use service::{VotingService, VotingServiceConfig};
pub use transition::compute_vote_transition;
