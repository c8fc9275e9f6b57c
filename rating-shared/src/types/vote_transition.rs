use serde::{Deserialize, Serialize};
use crate::types::VoteValue;

/// The outcome of applying a requested direction to a voter's previous value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteTransition {
    pub previous: Option<VoteValue>,
    pub next: VoteValue,
    pub delta: i64,
}

impl VoteTransition {
    /// A transition with a zero delta leaves both the vote and the rating untouched.
    pub fn is_noop(&self) -> bool {
        self.delta == 0
    }
}
