//! This module defines the storage seams used to cast votes: the per-pair vote
//! store, the aggregate rating counter, and the unit of work binding both together.
use async_trait::async_trait;
use rating_shared::types::{ItemId, UserVote};
use crate::errors::RatingRepositoryError;

/// Keyed storage of `UserVote` records, one per (item, voter) pair.
///
/// A `VoteStore` is always a view inside a unit of work. Reading a pair through
/// `get_vote` serialises it against every other unit of work touching the same
/// pair until this one commits or is dropped.
#[async_trait]
pub trait VoteStore: Send {
    /// Returns the current vote for the pair, or `None` if the voter never voted on the item.
    async fn get_vote(
        &mut self,
        item_id: ItemId,
        voter_id: &str,
    ) -> Result<Option<UserVote>, RatingRepositoryError>;

    /// Creates the record if absent, otherwise overwrites value and timestamp together.
    ///
    /// # Errors
    ///
    /// Returns `RatingRepositoryError::ItemNotFound` if the item does not exist.
    async fn put_vote(&mut self, vote: &UserVote) -> Result<(), RatingRepositoryError>;
}

/// Maintains each item's aggregate rating as the running sum of vote values.
#[async_trait]
pub trait RatingAggregator: Send {
    /// Adds `delta` to the item's rating using an atomic increment and returns the new value.
    ///
    /// # Errors
    ///
    /// Returns `RatingRepositoryError::ItemNotFound` if the item no longer exists.
    async fn apply_delta(
        &mut self,
        item_id: ItemId,
        delta: i64,
    ) -> Result<i64, RatingRepositoryError>;
}

/// A transaction over votes and ratings.
///
/// Either every write issued through it becomes visible on `commit`, or none does.
/// Dropping a unit of work without committing rolls it back.
#[async_trait]
pub trait VotingUnitOfWork: VoteStore + RatingAggregator {
    async fn commit(self: Box<Self>) -> Result<(), RatingRepositoryError>;
}

/// Entry point to the voting storage.
#[async_trait]
pub trait VotingRepository: Send + Sync {
    /// Opens a new unit of work.
    async fn begin(&self) -> Result<Box<dyn VotingUnitOfWork>, RatingRepositoryError>;

    /// Reads the committed vote for a pair without taking any lock.
    async fn get_vote(
        &self,
        item_id: ItemId,
        voter_id: &str,
    ) -> Result<Option<UserVote>, RatingRepositoryError>;

    /// Reads the committed rating of an item, `None` if the item does not exist.
    async fn get_rating(&self, item_id: ItemId) -> Result<Option<i64>, RatingRepositoryError>;
}
