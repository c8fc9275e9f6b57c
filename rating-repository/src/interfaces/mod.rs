//! This module defines and re-exports the interfaces for the rating repository.
//! It serves as a central point for accessing traits related to data interaction.
mod content;
mod voting;

pub use content::ContentRepository;
pub use voting::{RatingAggregator, VoteStore, VotingRepository, VotingUnitOfWork};
