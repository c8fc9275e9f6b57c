use serde::{Deserialize, Serialize};
use crate::types::{ItemId, VoteValue, VoterId};

/// Represents a user's vote on an item.
///
/// At most one record exists per (item, voter) pair. It is created on the first
/// cast and overwritten in place afterwards, never deleted while the item exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserVote {
    pub item_id: ItemId,
    pub voter_id: VoterId,
    pub value: VoteValue,
    pub voted_at: u64,
}
