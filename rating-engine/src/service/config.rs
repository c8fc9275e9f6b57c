//! Configuration types for the VotingService.
use std::time::Duration;

/// Default number of retries after a write conflict before giving up.
pub const DEFAULT_MAX_CONFLICT_RETRIES: usize = 3;

/// Configuration for the VotingService.
///
/// Controls how many times a vote is re-attempted when the store reports a
/// write conflict, and how long to back off between attempts.
#[derive(Debug, Clone)]
pub struct VotingServiceConfig {
    /// Retries after the first attempt. A vote is tried at most
    /// `max_conflict_retries + 1` times.
    pub max_conflict_retries: usize,
    /// Base of the exponential backoff between conflicting attempts.
    pub retry_base_delay: Duration,
    /// Upper bound for a single backoff delay.
    pub max_retry_delay: Duration,
}

impl Default for VotingServiceConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
            retry_base_delay: Duration::from_millis(10),
            max_retry_delay: Duration::from_millis(250),
        }
    }
}

impl VotingServiceConfig {
    /// Create a config with a custom retry bound and the default backoff.
    pub fn with_max_conflict_retries(max_conflict_retries: usize) -> Self {
        Self {
            max_conflict_retries,
            ..Self::default()
        }
    }
}
