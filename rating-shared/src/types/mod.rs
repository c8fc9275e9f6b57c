mod cast_outcome;
mod principal;
mod user_vote;
mod vote_transition;
mod vote_value;
mod writeup;

pub use cast_outcome::CastOutcome;
pub use principal::{Principal, Role};
pub use user_vote::UserVote;
pub use vote_transition::VoteTransition;
pub use vote_value::{VoteDirection, VoteValue, VoteValueError};
pub use writeup::{NewWriteup, Writeup, WriteupSort};

/// Identifier of a rateable item (a writeup).
pub type ItemId = uuid::Uuid;

/// Stable identifier of an authenticated principal, as issued by the authentication provider.
pub type VoterId = String;
