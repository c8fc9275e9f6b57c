//! The vote transition table.
//!
//! A vote request is always a direction (up or down). What gets stored, and by
//! how much the item's rating moves, depends only on the voter's prior stored
//! value for that item:
//!
//! | prior            | request | stored    | delta |
//! |------------------|---------|-----------|-------|
//! | none / retracted | up      | up        | +1    |
//! | none / retracted | down    | down      | -1    |
//! | up               | up      | retracted | -1    |
//! | down             | down    | retracted | +1    |
//! | down             | up      | up        | +2    |
//! | up               | down    | down      | -2    |
use rating_shared::types::{VoteDirection, VoteTransition, VoteValue};

/// Computes the stored value and rating delta for a vote request.
///
/// Re-voting the same direction retracts the vote. The returned delta always
/// equals `next - prior`, where an absent prior counts as zero.
pub fn compute_vote_transition(
    previous: Option<VoteValue>,
    requested: VoteDirection,
) -> VoteTransition {
    let (next, delta) = match (previous, requested) {
        (None | Some(VoteValue::Retracted), VoteDirection::Up) => (VoteValue::Up, 1),
        (None | Some(VoteValue::Retracted), VoteDirection::Down) => (VoteValue::Down, -1),
        (Some(VoteValue::Up), VoteDirection::Up) => (VoteValue::Retracted, -1),
        (Some(VoteValue::Down), VoteDirection::Down) => (VoteValue::Retracted, 1),
        (Some(VoteValue::Down), VoteDirection::Up) => (VoteValue::Up, 2),
        (Some(VoteValue::Up), VoteDirection::Down) => (VoteValue::Down, -2),
    };

    VoteTransition {
        previous,
        next,
        delta,
    }
}
