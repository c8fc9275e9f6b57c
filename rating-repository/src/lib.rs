//! # Rating Repository
//! This crate provides traits and implementations for persisting votes, aggregate
//! ratings and the writeups they belong to. It includes definitions for errors,
//! interfaces, a PostgreSQL implementation and an in-memory implementation with
//! the same transactional guarantees.
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;

pub use errors::RatingRepositoryError;
pub use interfaces::{ContentRepository, RatingAggregator, VoteStore, VotingRepository, VotingUnitOfWork};
pub use memory::InMemoryRepository;
pub use postgres::{PostgresContentRepository, PostgresVotingRepository};
