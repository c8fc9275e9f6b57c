use serde::{Deserialize, Serialize};
use crate::types::VoterId;

/// Role granted to an authenticated principal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

/// An authenticated caller. Passed explicitly into every operation that needs one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub id: VoterId,
    pub role: Role,
}

impl Principal {
    pub fn member(id: impl Into<VoterId>) -> Self {
        Self { id: id.into(), role: Role::Member }
    }

    pub fn admin(id: impl Into<VoterId>) -> Self {
        Self { id: id.into(), role: Role::Admin }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
