//! In-memory implementation of the rating repository.
//!
//! Offers the same guarantees as the PostgreSQL backend: a unit of work locks the
//! (item, voter) pairs it reads and the items whose rating it changes, stages its
//! writes, and publishes all of them in one critical section on `commit`. Dropping
//! an uncommitted unit of work discards the staged writes.
//!
//! Used as the test fake for the engine and as the `memory` storage backend of the
//! server. Faults can be injected with [`InMemoryRepository::set_available`] and
//! [`InMemoryRepository::inject_conflicts`].
mod keyed_locks;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rating_shared::types::{ItemId, NewWriteup, UserVote, VoterId, Writeup, WriteupSort};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use self::keyed_locks::KeyedLocks;
use crate::{
    ContentRepository, RatingAggregator, RatingRepositoryError, VoteStore, VotingRepository,
    VotingUnitOfWork,
};

type PairKey = (ItemId, VoterId);

struct StoredWriteup {
    sequence: u64,
    writeup: Writeup,
}

#[derive(Default)]
struct MemoryState {
    writeups: HashMap<ItemId, StoredWriteup>,
    votes: HashMap<PairKey, UserVote>,
}

struct Inner {
    state: Mutex<MemoryState>,
    pair_locks: KeyedLocks<PairKey>,
    item_locks: KeyedLocks<ItemId>,
    available: AtomicBool,
    pending_conflicts: AtomicUsize,
    next_sequence: AtomicU64,
}

impl Inner {
    fn ensure_available(&self) -> Result<(), RatingRepositoryError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RatingRepositoryError::unavailable("in-memory store is offline"))
        }
    }

    fn take_injected_conflict(&self) -> bool {
        self.pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// In-memory vote, rating and writeup storage. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct InMemoryRepository {
    inner: Arc<Inner>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(MemoryState::default()),
                pair_locks: KeyedLocks::new(),
                item_locks: KeyedLocks::new(),
                available: AtomicBool::new(true),
                pending_conflicts: AtomicUsize::new(0),
                next_sequence: AtomicU64::new(0),
            }),
        }
    }

    /// Simulates the backing store going offline (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// Makes the next `count` commits fail with `RatingRepositoryError::Conflict`.
    pub fn inject_conflicts(&self, count: usize) {
        self.inner.pending_conflicts.store(count, Ordering::SeqCst);
    }

    /// Sum of the committed vote values for an item. Test helper for the rating invariant.
    pub async fn sum_of_votes(&self, item_id: ItemId) -> i64 {
        let state = self.inner.state.lock().await;
        state
            .votes
            .values()
            .filter(|vote| vote.item_id == item_id)
            .map(|vote| vote.value.as_i64())
            .sum()
    }

    /// Number of vote records stored for an item, retracted ones included.
    pub async fn vote_count(&self, item_id: ItemId) -> usize {
        let state = self.inner.state.lock().await;
        state.votes.keys().filter(|(id, _)| *id == item_id).count()
    }
}

fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// A staged transaction against an [`InMemoryRepository`].
pub struct InMemoryUnitOfWork {
    inner: Arc<Inner>,
    pair_guards: HashMap<PairKey, OwnedMutexGuard<()>>,
    item_guards: HashMap<ItemId, OwnedMutexGuard<()>>,
    staged_votes: HashMap<PairKey, UserVote>,
    staged_deltas: HashMap<ItemId, i64>,
}

impl InMemoryUnitOfWork {
    async fn lock_pair(&mut self, key: &PairKey) {
        if !self.pair_guards.contains_key(key) {
            let guard = self.inner.pair_locks.acquire(key.clone()).await;
            self.pair_guards.insert(key.clone(), guard);
        }
    }

    async fn lock_item(&mut self, item_id: ItemId) {
        if !self.item_guards.contains_key(&item_id) {
            let guard = self.inner.item_locks.acquire(item_id).await;
            self.item_guards.insert(item_id, guard);
        }
    }
}

#[async_trait]
impl VoteStore for InMemoryUnitOfWork {
    async fn get_vote(
        &mut self,
        item_id: ItemId,
        voter_id: &str,
    ) -> Result<Option<UserVote>, RatingRepositoryError> {
        self.inner.ensure_available()?;

        let key = (item_id, voter_id.to_string());
        self.lock_pair(&key).await;

        if let Some(staged) = self.staged_votes.get(&key) {
            return Ok(Some(staged.clone()));
        }

        let state = self.inner.state.lock().await;
        Ok(state.votes.get(&key).cloned())
    }

    async fn put_vote(&mut self, vote: &UserVote) -> Result<(), RatingRepositoryError> {
        self.inner.ensure_available()?;

        let key = (vote.item_id, vote.voter_id.clone());
        self.lock_pair(&key).await;

        {
            let state = self.inner.state.lock().await;
            if !state.writeups.contains_key(&vote.item_id) {
                return Err(RatingRepositoryError::ItemNotFound(vote.item_id));
            }
        }

        self.staged_votes.insert(key, vote.clone());
        Ok(())
    }
}

#[async_trait]
impl RatingAggregator for InMemoryUnitOfWork {
    async fn apply_delta(
        &mut self,
        item_id: ItemId,
        delta: i64,
    ) -> Result<i64, RatingRepositoryError> {
        self.inner.ensure_available()?;
        self.lock_item(item_id).await;

        let state = self.inner.state.lock().await;
        let stored = state
            .writeups
            .get(&item_id)
            .ok_or(RatingRepositoryError::ItemNotFound(item_id))?;

        let staged = self.staged_deltas.entry(item_id).or_insert(0);
        *staged += delta;

        Ok(stored.writeup.rating + *staged)
    }
}

#[async_trait]
impl VotingUnitOfWork for InMemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), RatingRepositoryError> {
        self.inner.ensure_available()?;

        if self.inner.take_injected_conflict() {
            return Err(RatingRepositoryError::conflict("injected write conflict"));
        }

        let mut state = self.inner.state.lock().await;

        for item_id in self.staged_deltas.keys() {
            if !state.writeups.contains_key(item_id) {
                return Err(RatingRepositoryError::ItemNotFound(*item_id));
            }
        }
        for (item_id, _) in self.staged_votes.keys() {
            if !state.writeups.contains_key(item_id) {
                return Err(RatingRepositoryError::ItemNotFound(*item_id));
            }
        }

        for (item_id, delta) in &self.staged_deltas {
            if let Some(stored) = state.writeups.get_mut(item_id) {
                stored.writeup.rating += delta;
            }
        }
        for (key, vote) in &self.staged_votes {
            state.votes.insert(key.clone(), vote.clone());
        }

        debug!(
            votes = self.staged_votes.len(),
            items = self.staged_deltas.len(),
            "Committed in-memory unit of work"
        );

        Ok(())
    }
}

#[async_trait]
impl VotingRepository for InMemoryRepository {
    async fn begin(&self) -> Result<Box<dyn VotingUnitOfWork>, RatingRepositoryError> {
        self.inner.ensure_available()?;

        Ok(Box::new(InMemoryUnitOfWork {
            inner: self.inner.clone(),
            pair_guards: HashMap::new(),
            item_guards: HashMap::new(),
            staged_votes: HashMap::new(),
            staged_deltas: HashMap::new(),
        }))
    }

    async fn get_vote(
        &self,
        item_id: ItemId,
        voter_id: &str,
    ) -> Result<Option<UserVote>, RatingRepositoryError> {
        self.inner.ensure_available()?;
        let state = self.inner.state.lock().await;
        Ok(state.votes.get(&(item_id, voter_id.to_string())).cloned())
    }

    async fn get_rating(&self, item_id: ItemId) -> Result<Option<i64>, RatingRepositoryError> {
        self.inner.ensure_available()?;
        let state = self.inner.state.lock().await;
        Ok(state.writeups.get(&item_id).map(|stored| stored.writeup.rating))
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn create_writeup(&self, writeup: &NewWriteup) -> Result<Writeup, RatingRepositoryError> {
        self.inner.ensure_available()?;

        let created = Writeup {
            id: Uuid::new_v4(),
            title: writeup.title.clone(),
            kind: writeup.kind.clone(),
            topic: writeup.topic.clone(),
            url: writeup.url.clone(),
            description: writeup.description.clone(),
            rating: 0,
            created_at: now_unix_seconds(),
        };
        let sequence = self.inner.next_sequence.fetch_add(1, Ordering::SeqCst);

        let mut state = self.inner.state.lock().await;
        state.writeups.insert(
            created.id,
            StoredWriteup {
                sequence,
                writeup: created.clone(),
            },
        );

        Ok(created)
    }

    async fn get_writeup(&self, id: ItemId) -> Result<Option<Writeup>, RatingRepositoryError> {
        self.inner.ensure_available()?;
        let state = self.inner.state.lock().await;
        Ok(state.writeups.get(&id).map(|stored| stored.writeup.clone()))
    }

    async fn delete_writeup(&self, id: ItemId) -> Result<bool, RatingRepositoryError> {
        self.inner.ensure_available()?;

        // Waits for in-flight rating updates on this item to finish.
        let _item_guard = self.inner.item_locks.acquire(id).await;

        let mut state = self.inner.state.lock().await;
        let deleted = state.writeups.remove(&id).is_some();
        state.votes.retain(|(item_id, _), _| *item_id != id);

        Ok(deleted)
    }

    async fn list_writeups(
        &self,
        sort: WriteupSort,
        limit: Option<u32>,
    ) -> Result<Vec<Writeup>, RatingRepositoryError> {
        self.inner.ensure_available()?;
        let state = self.inner.state.lock().await;

        let mut stored: Vec<&StoredWriteup> = state.writeups.values().collect();
        match sort {
            WriteupSort::Rating => stored.sort_by(|a, b| {
                b.writeup
                    .rating
                    .cmp(&a.writeup.rating)
                    .then(b.writeup.created_at.cmp(&a.writeup.created_at))
                    .then(b.sequence.cmp(&a.sequence))
            }),
            WriteupSort::Newest => stored.sort_by(|a, b| {
                b.writeup
                    .created_at
                    .cmp(&a.writeup.created_at)
                    .then(b.sequence.cmp(&a.sequence))
            }),
        }

        let limit = limit.map_or(usize::MAX, |n| n as usize);
        Ok(stored
            .into_iter()
            .take(limit)
            .map(|stored| stored.writeup.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rating_shared::types::VoteValue;
    use std::time::Duration;

    fn make_new_writeup(title: &str) -> NewWriteup {
        NewWriteup {
            title: title.to_string(),
            kind: "writeup".to_string(),
            topic: "pwn".to_string(),
            url: "https://example.com/writeup".to_string(),
            description: "heap exploitation notes".to_string(),
        }
    }

    fn make_user_vote(item_id: ItemId, voter_id: &str, value: VoteValue) -> UserVote {
        UserVote {
            item_id,
            voter_id: voter_id.to_string(),
            value,
            voted_at: 1755182913,
        }
    }

    #[tokio::test]
    async fn test_commit_publishes_vote_and_rating_together() {
        let repository = InMemoryRepository::new();
        let writeup = repository.create_writeup(&make_new_writeup("a")).await.unwrap();

        let mut uow = repository.begin().await.unwrap();
        assert_eq!(uow.get_vote(writeup.id, "alice").await.unwrap(), None);
        uow.put_vote(&make_user_vote(writeup.id, "alice", VoteValue::Up))
            .await
            .unwrap();
        assert_eq!(uow.apply_delta(writeup.id, 1).await.unwrap(), 1);

        // Nothing is visible before commit
        assert_eq!(repository.get_rating(writeup.id).await.unwrap(), Some(0));
        assert_eq!(repository.get_vote(writeup.id, "alice").await.unwrap(), None);

        uow.commit().await.unwrap();

        assert_eq!(repository.get_rating(writeup.id).await.unwrap(), Some(1));
        assert_eq!(
            repository.get_vote(writeup.id, "alice").await.unwrap().map(|v| v.value),
            Some(VoteValue::Up)
        );
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_rolls_back() {
        let repository = InMemoryRepository::new();
        let writeup = repository.create_writeup(&make_new_writeup("a")).await.unwrap();

        {
            let mut uow = repository.begin().await.unwrap();
            uow.put_vote(&make_user_vote(writeup.id, "alice", VoteValue::Down))
                .await
                .unwrap();
            uow.apply_delta(writeup.id, -1).await.unwrap();
        }

        assert_eq!(repository.get_rating(writeup.id).await.unwrap(), Some(0));
        assert_eq!(repository.vote_count(writeup.id).await, 0);

        // Locks were released with the dropped unit of work
        let mut uow = repository.begin().await.unwrap();
        assert_eq!(uow.get_vote(writeup.id, "alice").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_apply_delta_on_missing_item() {
        let repository = InMemoryRepository::new();
        let missing = Uuid::new_v4();

        let mut uow = repository.begin().await.unwrap();
        let result = uow.apply_delta(missing, 1).await;
        assert!(matches!(result, Err(RatingRepositoryError::ItemNotFound(id)) if id == missing));

        let result = uow.put_vote(&make_user_vote(missing, "alice", VoteValue::Up)).await;
        assert!(matches!(result, Err(RatingRepositoryError::ItemNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_writeup_cascades_votes() {
        let repository = InMemoryRepository::new();
        let writeup = repository.create_writeup(&make_new_writeup("a")).await.unwrap();
        let other = repository.create_writeup(&make_new_writeup("b")).await.unwrap();

        let mut uow = repository.begin().await.unwrap();
        uow.put_vote(&make_user_vote(writeup.id, "alice", VoteValue::Up)).await.unwrap();
        uow.put_vote(&make_user_vote(other.id, "alice", VoteValue::Up)).await.unwrap();
        uow.apply_delta(writeup.id, 1).await.unwrap();
        uow.apply_delta(other.id, 1).await.unwrap();
        uow.commit().await.unwrap();

        assert!(repository.delete_writeup(writeup.id).await.unwrap());
        assert!(!repository.delete_writeup(writeup.id).await.unwrap());

        assert_eq!(repository.vote_count(writeup.id).await, 0);
        assert_eq!(repository.vote_count(other.id).await, 1);
        assert_eq!(repository.get_rating(writeup.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_waits_for_in_flight_vote_then_cascades() {
        let repository = InMemoryRepository::new();
        let writeup = repository.create_writeup(&make_new_writeup("a")).await.unwrap();

        let mut uow = repository.begin().await.unwrap();
        uow.get_vote(writeup.id, "alice").await.unwrap();
        uow.put_vote(&make_user_vote(writeup.id, "alice", VoteValue::Up)).await.unwrap();
        assert_eq!(uow.apply_delta(writeup.id, 1).await.unwrap(), 1);

        let deleter = repository.clone();
        let mut delete = tokio::spawn(async move { deleter.delete_writeup(writeup.id).await });

        // The vote holds the item lock, so the delete cannot finish yet.
        let early = tokio::time::timeout(Duration::from_millis(50), &mut delete).await;
        assert!(early.is_err());
        assert!(repository.get_writeup(writeup.id).await.unwrap().is_some());

        uow.commit().await.unwrap();
        assert!(delete.await.unwrap().unwrap());

        assert_eq!(repository.vote_count(writeup.id).await, 0);
        assert_eq!(repository.sum_of_votes(writeup.id).await, 0);
        assert_eq!(repository.get_rating(writeup.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_vote_after_concurrent_delete_reports_missing_item() {
        let repository = InMemoryRepository::new();
        let writeup = repository.create_writeup(&make_new_writeup("a")).await.unwrap();

        let mut uow = repository.begin().await.unwrap();
        uow.get_vote(writeup.id, "alice").await.unwrap();
        uow.put_vote(&make_user_vote(writeup.id, "alice", VoteValue::Up)).await.unwrap();

        // Only the pair lock is held so far; the delete goes through.
        assert!(repository.delete_writeup(writeup.id).await.unwrap());

        let err = uow.apply_delta(writeup.id, 1).await.unwrap_err();
        assert!(matches!(err, RatingRepositoryError::ItemNotFound(id) if id == writeup.id));
        drop(uow);

        assert_eq!(repository.vote_count(writeup.id).await, 0);
    }

    #[tokio::test]
    async fn test_list_writeups_by_rating_then_newest() {
        let repository = InMemoryRepository::new();
        let first = repository.create_writeup(&make_new_writeup("first")).await.unwrap();
        let second = repository.create_writeup(&make_new_writeup("second")).await.unwrap();
        let third = repository.create_writeup(&make_new_writeup("third")).await.unwrap();

        let mut uow = repository.begin().await.unwrap();
        uow.apply_delta(first.id, 2).await.unwrap();
        uow.commit().await.unwrap();

        let by_rating = repository.list_writeups(WriteupSort::Rating, None).await.unwrap();
        let titles: Vec<&str> = by_rating.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "third", "second"]);

        let newest = repository.list_writeups(WriteupSort::Newest, Some(2)).await.unwrap();
        let ids: Vec<ItemId> = newest.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![third.id, second.id]);
    }

    #[tokio::test]
    async fn test_unavailable_store_rejects_operations() {
        let repository = InMemoryRepository::new();
        let writeup = repository.create_writeup(&make_new_writeup("a")).await.unwrap();

        repository.set_available(false);
        assert!(matches!(
            repository.begin().await,
            Err(RatingRepositoryError::Unavailable(_))
        ));
        assert!(matches!(
            repository.get_rating(writeup.id).await,
            Err(RatingRepositoryError::Unavailable(_))
        ));

        repository.set_available(true);
        assert_eq!(repository.get_rating(writeup.id).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_injected_conflicts_fail_commits() {
        let repository = InMemoryRepository::new();
        let writeup = repository.create_writeup(&make_new_writeup("a")).await.unwrap();
        repository.inject_conflicts(1);

        let mut uow = repository.begin().await.unwrap();
        uow.apply_delta(writeup.id, 1).await.unwrap();
        let result = uow.commit().await;
        assert!(matches!(result, Err(RatingRepositoryError::Conflict(_))));
        assert_eq!(repository.get_rating(writeup.id).await.unwrap(), Some(0));

        let mut uow = repository.begin().await.unwrap();
        uow.apply_delta(writeup.id, 1).await.unwrap();
        uow.commit().await.unwrap();
        assert_eq!(repository.get_rating(writeup.id).await.unwrap(), Some(1));
    }
}
