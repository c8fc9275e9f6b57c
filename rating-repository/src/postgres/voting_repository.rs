use async_trait::async_trait;
use rating_shared::types::{ItemId, UserVote};
use tracing::debug;

use super::{to_timestamp, user_vote_from_row};
use crate::{RatingAggregator, RatingRepositoryError, VoteStore, VotingRepository, VotingUnitOfWork};

/// PostgreSQL implementation of the voting repository.
///
/// Every unit of work is a database transaction. Two units of work touching the
/// same (writeup, voter) pair are serialised through `pg_advisory_xact_lock`, which
/// also covers the first vote of a pair when no row exists yet to lock.
pub struct PostgresVotingRepository {
    pool: sqlx::PgPool,
}

impl PostgresVotingRepository {
    /// Creates a new PostgreSQL repository instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool with the rating schema applied
    ///
    /// # Returns
    ///
    /// * `Ok(PostgresVotingRepository)` - Ready-to-use repository instance
    /// * `Err(RatingRepositoryError)` - Future validation errors (currently always succeeds)
    pub async fn new(pool: sqlx::PgPool) -> Result<Self, RatingRepositoryError> {
        Ok(Self { pool })
    }
}

/// Key hashed into the advisory lock that guards one (writeup, voter) pair.
fn pair_lock_key(item_id: ItemId, voter_id: &str) -> String {
    format!("writeup_vote:{item_id}:{voter_id}")
}

/// A vote transaction against PostgreSQL.
///
/// Dropping it without calling `commit` rolls the transaction back.
pub struct PostgresUnitOfWork {
    tx: sqlx::Transaction<'static, sqlx::Postgres>,
}

#[async_trait]
impl VoteStore for PostgresUnitOfWork {
    async fn get_vote(
        &mut self,
        item_id: ItemId,
        voter_id: &str,
    ) -> Result<Option<UserVote>, RatingRepositoryError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(pair_lock_key(item_id, voter_id))
            .execute(&mut *self.tx)
            .await?;

        let row = sqlx::query(
            r#"
            SELECT writeup_id, voter_id, value, voted_at
            FROM writeup_votes
            WHERE writeup_id = $1 AND voter_id = $2
            "#,
        )
        .bind(item_id)
        .bind(voter_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(user_vote_from_row).transpose()
    }

    async fn put_vote(&mut self, vote: &UserVote) -> Result<(), RatingRepositoryError> {
        let voted_at = to_timestamp(vote.voted_at)?;

        sqlx::query(
            r#"
            INSERT INTO writeup_votes (writeup_id, voter_id, value, voted_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (writeup_id, voter_id)
            DO UPDATE SET
                value = EXCLUDED.value,
                voted_at = EXCLUDED.voted_at
            "#,
        )
        .bind(vote.item_id)
        .bind(&vote.voter_id)
        .bind(vote.value.as_i16())
        .bind(voted_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| missing_item_or(e, vote.item_id))?;

        Ok(())
    }
}

/// Maps a foreign key violation on `writeup_votes.writeup_id` to `ItemNotFound`.
fn missing_item_or(err: sqlx::Error, item_id: ItemId) -> RatingRepositoryError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_foreign_key_violation() {
            return RatingRepositoryError::ItemNotFound(item_id);
        }
    }
    err.into()
}

#[async_trait]
impl RatingAggregator for PostgresUnitOfWork {
    async fn apply_delta(
        &mut self,
        item_id: ItemId,
        delta: i64,
    ) -> Result<i64, RatingRepositoryError> {
        let rating: Option<i64> = sqlx::query_scalar(
            "UPDATE writeups SET rating = rating + $2 WHERE id = $1 RETURNING rating",
        )
        .bind(item_id)
        .bind(delta)
        .fetch_optional(&mut *self.tx)
        .await?;

        debug!(item_id = %item_id, delta, new_rating = ?rating, "Applied rating delta");

        rating.ok_or(RatingRepositoryError::ItemNotFound(item_id))
    }
}

#[async_trait]
impl VotingUnitOfWork for PostgresUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), RatingRepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl VotingRepository for PostgresVotingRepository {
    async fn begin(&self) -> Result<Box<dyn VotingUnitOfWork>, RatingRepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresUnitOfWork { tx }))
    }

    async fn get_vote(
        &self,
        item_id: ItemId,
        voter_id: &str,
    ) -> Result<Option<UserVote>, RatingRepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT writeup_id, voter_id, value, voted_at
            FROM writeup_votes
            WHERE writeup_id = $1 AND voter_id = $2
            "#,
        )
        .bind(item_id)
        .bind(voter_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_vote_from_row).transpose()
    }

    async fn get_rating(&self, item_id: ItemId) -> Result<Option<i64>, RatingRepositoryError> {
        let rating: Option<i64> = sqlx::query_scalar("SELECT rating FROM writeups WHERE id = $1")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(rating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::uuid;

    #[test]
    fn test_pair_lock_key_distinguishes_voters() {
        let item_id = uuid!("a7ef0016-a2f4-44fb-82ca-a4f5c61d2cf5");
        assert_ne!(pair_lock_key(item_id, "alice"), pair_lock_key(item_id, "bob"));
        assert_eq!(
            pair_lock_key(item_id, "alice"),
            "writeup_vote:a7ef0016-a2f4-44fb-82ca-a4f5c61d2cf5:alice"
        );
    }
}
