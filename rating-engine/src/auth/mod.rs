//! Caller authentication.
//!
//! The engine never inspects credentials itself. An [`AuthProvider`] turns an
//! opaque bearer token into a [`Principal`], and the services only ever see
//! the resulting principal (or its absence).
use std::collections::HashMap;

use async_trait::async_trait;
use rating_shared::types::{Principal, Role};
use tracing::debug;

use crate::errors::AuthError;

/// Resolves bearer tokens to principals.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Returns `Ok(None)` when the token is not recognised.
    async fn authenticate(&self, token: &str) -> Result<Option<Principal>, AuthError>;
}

/// An [`AuthProvider`] backed by a fixed token table.
///
/// Suitable for deployments where sign-up and sign-in happen elsewhere and
/// the service is handed a list of pre-issued tokens.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthProvider {
    tokens: HashMap<String, Principal>,
}

impl StaticTokenAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_principal(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.tokens.insert(token.into(), principal);
        self
    }

    /// Parses a comma separated list of `token=voter_id:role` entries.
    ///
    /// The role may be omitted, in which case the principal is a member.
    /// Empty entries are skipped.
    pub fn parse(entries: &str) -> Result<Self, AuthError> {
        let mut provider = Self::new();

        for entry in entries.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            let (token, identity) = entry
                .split_once('=')
                .ok_or_else(|| AuthError::MalformedEntry(entry.to_string()))?;
            let (voter_id, role) = match identity.split_once(':') {
                Some((voter_id, role)) => (voter_id.trim(), parse_role(role.trim())?),
                None => (identity.trim(), Role::Member),
            };

            let token = token.trim();
            if token.is_empty() || voter_id.is_empty() {
                return Err(AuthError::MalformedEntry(entry.to_string()));
            }
            if provider.tokens.contains_key(token) {
                return Err(AuthError::DuplicateToken(voter_id.to_string()));
            }

            provider.tokens.insert(
                token.to_string(),
                Principal {
                    id: voter_id.to_string(),
                    role,
                },
            );
        }

        debug!(principals = provider.tokens.len(), "Loaded static auth tokens");
        Ok(provider)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn parse_role(role: &str) -> Result<Role, AuthError> {
    match role.to_ascii_lowercase().as_str() {
        "member" | "" => Ok(Role::Member),
        "admin" => Ok(Role::Admin),
        _ => Err(AuthError::UnknownRole(role.to_string())),
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuthProvider {
    async fn authenticate(&self, token: &str) -> Result<Option<Principal>, AuthError> {
        Ok(self.tokens.get(token).cloned())
    }
}
