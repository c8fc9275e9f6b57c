use std::sync::Arc;

use rating_engine::{AuthProvider, ContentService, VotingService};

use crate::config::Dependencies;

/// Shared handles every request handler can reach.
#[derive(Clone)]
pub struct AppState {
    pub voting: Arc<VotingService>,
    pub content: Arc<ContentService>,
    pub auth: Arc<dyn AuthProvider>,
}

impl From<Dependencies> for AppState {
    fn from(deps: Dependencies) -> Self {
        Self {
            voting: deps.voting,
            content: deps.content,
            auth: deps.auth,
        }
    }
}
