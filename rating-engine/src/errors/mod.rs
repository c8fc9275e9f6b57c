mod auth;
mod content;
mod voting;

pub use auth::AuthError;
pub use content::ContentError;
pub use voting::VotingError;
