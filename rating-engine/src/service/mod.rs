//! Voting service implementation.
//!
//! This module provides the operation that records a voter's intent on a
//! writeup and keeps the writeup's rating equal to the sum of its stored
//! votes. Each vote runs inside one unit of work: the prior vote is read, the
//! transition computed, the new value and the rating delta written, and the
//! whole thing committed or dropped together.
mod config;

pub use config::{DEFAULT_MAX_CONFLICT_RETRIES, VotingServiceConfig};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rating_repository::{RatingRepositoryError, VotingRepository, VotingUnitOfWork};
use rating_shared::types::{
    CastOutcome, ItemId, Principal, UserVote, VoteDirection, VoteTransition, VoteValue,
};
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, instrument, warn};

use crate::errors::VotingError;
use crate::transition::compute_vote_transition;

/// Applies vote requests against a [`VotingRepository`].
///
/// The service is cheap to share: it holds the repository behind an `Arc`
/// and keeps no per-request state.
pub struct VotingService {
    repository: Arc<dyn VotingRepository>,
    config: VotingServiceConfig,
}

impl VotingService {
    /// Create a new VotingService with the default retry configuration.
    pub fn new(repository: Arc<dyn VotingRepository>) -> Self {
        Self {
            repository,
            config: VotingServiceConfig::default(),
        }
    }

    /// Create a new VotingService with a custom retry configuration.
    pub fn with_config(repository: Arc<dyn VotingRepository>, config: VotingServiceConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &VotingServiceConfig {
        &self.config
    }

    /// Record a vote from `caller` on `item_id` and return the stored value
    /// together with the item's rating right after this vote was applied.
    ///
    /// Voting the same direction twice retracts the vote. Voting the opposite
    /// direction flips it. On any error nothing is persisted.
    ///
    /// # Errors
    ///
    /// * `VotingError::Unauthenticated` - If there is no caller
    /// * `VotingError::ItemNotFound` - If the writeup does not exist
    /// * `VotingError::StorageUnavailable` - If the store cannot be reached
    /// * `VotingError::ConflictRetryExhausted` - If every attempt hit a write conflict
    #[instrument(skip_all, fields(item_id = %item_id, direction = ?direction))]
    pub async fn cast_vote(
        &self,
        caller: Option<&Principal>,
        item_id: ItemId,
        direction: VoteDirection,
    ) -> Result<CastOutcome, VotingError> {
        let voter_id = authenticated_voter(caller)?;

        let strategy = ExponentialBackoff::from_millis(self.retry_base_millis())
            .factor(2)
            .max_delay(self.config.max_retry_delay)
            .map(jitter)
            .take(self.config.max_conflict_retries);

        let attempts = AtomicUsize::new(0);
        let result = RetryIf::spawn(
            strategy,
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                self.try_cast_vote(voter_id, item_id, direction)
            },
            |err: &RatingRepositoryError| {
                let retry = err.is_conflict();
                if retry {
                    warn!(
                        voter_id = %voter_id,
                        attempt = attempts.load(Ordering::SeqCst),
                        error = %err,
                        "Vote hit a write conflict, retrying"
                    );
                }
                retry
            },
        )
        .await;

        match result {
            Ok(outcome) => {
                info!(
                    voter_id = %voter_id,
                    applied_value = outcome.applied_value.as_i64(),
                    new_rating = outcome.new_rating,
                    "Vote applied"
                );
                Ok(outcome)
            }
            Err(err) if err.is_conflict() => {
                let attempts = attempts.load(Ordering::SeqCst);
                warn!(voter_id = %voter_id, attempts, "Giving up on vote after repeated conflicts");
                Err(VotingError::ConflictRetryExhausted { attempts })
            }
            Err(err) => {
                warn!(voter_id = %voter_id, error = %err, "Vote failed");
                Err(err.into())
            }
        }
    }

    /// The caller's currently stored value for `item_id`, if they ever voted.
    ///
    /// Returns `VotingError::ItemNotFound` when the writeup does not exist.
    pub async fn current_vote(
        &self,
        caller: Option<&Principal>,
        item_id: ItemId,
    ) -> Result<Option<VoteValue>, VotingError> {
        let voter_id = authenticated_voter(caller)?;
        match self.repository.get_vote(item_id, voter_id).await? {
            Some(vote) => Ok(Some(vote.value)),
            None => {
                // Distinguishes "never voted" from "no such writeup".
                self.rating(item_id).await?;
                Ok(None)
            }
        }
    }

    /// The committed rating of `item_id`.
    pub async fn rating(&self, item_id: ItemId) -> Result<i64, VotingError> {
        self.repository
            .get_rating(item_id)
            .await?
            .ok_or(VotingError::ItemNotFound(item_id))
    }

    async fn try_cast_vote(
        &self,
        voter_id: &str,
        item_id: ItemId,
        direction: VoteDirection,
    ) -> Result<CastOutcome, RatingRepositoryError> {
        let mut uow = self.repository.begin().await?;

        let previous = uow.get_vote(item_id, voter_id).await?;
        let transition = compute_vote_transition(previous.map(|vote| vote.value), direction);

        debug!(
            voter_id = %voter_id,
            previous = ?transition.previous,
            next = ?transition.next,
            delta = transition.delta,
            "Computed vote transition"
        );

        self.apply_transition(uow, voter_id, item_id, transition).await
    }

    /// Writes `transition` through `uow` and commits it.
    ///
    /// A zero delta writes nothing: the unit of work is dropped and the
    /// committed rating is reported unchanged.
    async fn apply_transition(
        &self,
        mut uow: Box<dyn VotingUnitOfWork>,
        voter_id: &str,
        item_id: ItemId,
        transition: VoteTransition,
    ) -> Result<CastOutcome, RatingRepositoryError> {
        if transition.is_noop() {
            drop(uow);
            let new_rating = self
                .repository
                .get_rating(item_id)
                .await?
                .ok_or(RatingRepositoryError::ItemNotFound(item_id))?;
            return Ok(CastOutcome {
                applied_value: transition.next,
                new_rating,
            });
        }

        uow.put_vote(&UserVote {
            item_id,
            voter_id: voter_id.to_string(),
            value: transition.next,
            voted_at: now_unix_seconds(),
        })
        .await?;
        let new_rating = uow.apply_delta(item_id, transition.delta).await?;
        uow.commit().await?;

        Ok(CastOutcome {
            applied_value: transition.next,
            new_rating,
        })
    }

    fn retry_base_millis(&self) -> u64 {
        u64::try_from(self.config.retry_base_delay.as_millis())
            .unwrap_or(u64::MAX)
            .max(1)
    }
}

fn authenticated_voter(caller: Option<&Principal>) -> Result<&str, VotingError> {
    match caller {
        Some(principal) if !principal.id.trim().is_empty() => Ok(principal.id.as_str()),
        _ => Err(VotingError::Unauthenticated),
    }
}

fn now_unix_seconds() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}
