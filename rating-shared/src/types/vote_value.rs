use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when converting raw integers into vote types.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum VoteValueError {
    #[error("Invalid vote value: {0}")]
    InvalidValue(i64),
    #[error("Invalid vote direction: {0} (expected 1 or -1)")]
    InvalidDirection(i64),
}

/// The value stored for a (item, voter) pair.
///
/// `Retracted` is kept explicitly instead of deleting the record, so a voter that
/// retracted is distinguishable from one that never voted. Both behave the same
/// when computing transitions.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "i64", into = "i64")]
pub enum VoteValue {
    /// A dislike, contributes -1 to the aggregate rating.
    Down,
    /// A previously cast vote that has been withdrawn, contributes nothing.
    Retracted,
    /// A like, contributes +1 to the aggregate rating.
    Up,
}

impl VoteValue {
    /// Signed contribution of this value to the item's aggregate rating.
    pub fn as_i64(self) -> i64 {
        match self {
            VoteValue::Down => -1,
            VoteValue::Retracted => 0,
            VoteValue::Up => 1,
        }
    }

    pub fn as_i16(self) -> i16 {
        self.as_i64() as i16
    }
}

impl TryFrom<i64> for VoteValue {
    type Error = VoteValueError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(VoteValue::Down),
            0 => Ok(VoteValue::Retracted),
            1 => Ok(VoteValue::Up),
            other => Err(VoteValueError::InvalidValue(other)),
        }
    }
}

impl TryFrom<i16> for VoteValue {
    type Error = VoteValueError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        VoteValue::try_from(i64::from(value))
    }
}

impl From<VoteValue> for i64 {
    fn from(value: VoteValue) -> Self {
        value.as_i64()
    }
}

/// The direction a voter asks for when clicking like or dislike.
///
/// Zero is not a valid request; retraction happens by repeating the current direction.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "i64", into = "i64")]
pub enum VoteDirection {
    Up,
    Down,
}

impl From<VoteDirection> for VoteValue {
    fn from(direction: VoteDirection) -> Self {
        match direction {
            VoteDirection::Up => VoteValue::Up,
            VoteDirection::Down => VoteValue::Down,
        }
    }
}

impl TryFrom<i64> for VoteDirection {
    type Error = VoteValueError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteDirection::Up),
            -1 => Ok(VoteDirection::Down),
            other => Err(VoteValueError::InvalidDirection(other)),
        }
    }
}

impl From<VoteDirection> for i64 {
    fn from(direction: VoteDirection) -> Self {
        VoteValue::from(direction).as_i64()
    }
}
