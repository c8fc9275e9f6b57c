use serde::{Deserialize, Serialize};
use crate::types::VoteValue;

/// Returned to the presentation layer after a vote is committed.
///
/// `new_rating` is authoritative; callers display it as-is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CastOutcome {
    pub applied_value: VoteValue,
    pub new_rating: i64,
}
