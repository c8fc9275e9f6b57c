//! PostgreSQL implementation of the rating repository.
//!
//! Provides a production-ready PostgreSQL backend for the `VotingRepository` and
//! `ContentRepository` traits with connection pooling and transaction safety.
//!
//! ## Key Features
//!
//! - Connection pooling with `sqlx::PgPool`
//! - One transaction per cast vote, rolled back automatically when dropped
//! - Per-pair serialisation with transaction-scoped advisory locks
//! - Atomic rating increments with `UPDATE ... RETURNING`
//! - Upsert support with `ON CONFLICT DO UPDATE`
//!
//! ## Database Tables
//!
//! - `writeups`: Writeup display fields and the aggregate `rating`
//! - `writeup_votes`: One vote record per (writeup, voter) pair
mod content_repository;
mod voting_repository;

pub use content_repository::PostgresContentRepository;
pub use voting_repository::{PostgresUnitOfWork, PostgresVotingRepository};

use crate::errors::RatingRepositoryError;
use rating_shared::types::{UserVote, VoteValue, Writeup};
use sqlx::Row;
use sqlx::postgres::PgRow;
use time::OffsetDateTime;

/// Embedded schema migrations for the rating tables.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("src/postgres/migrations");

/// Applies all pending migrations to the database behind `pool`.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), RatingRepositoryError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

fn to_timestamp(unix_seconds: u64) -> Result<OffsetDateTime, RatingRepositoryError> {
    i64::try_from(unix_seconds)
        .ok()
        .and_then(|seconds| OffsetDateTime::from_unix_timestamp(seconds).ok())
        .ok_or(RatingRepositoryError::InvalidTimestamp(unix_seconds))
}

fn from_timestamp(timestamp: OffsetDateTime) -> u64 {
    timestamp.unix_timestamp().max(0) as u64
}

fn user_vote_from_row(row: &PgRow) -> Result<UserVote, RatingRepositoryError> {
    let value: i16 = row.try_get("value")?;
    let voted_at: OffsetDateTime = row.try_get("voted_at")?;

    Ok(UserVote {
        item_id: row.try_get("writeup_id")?,
        voter_id: row.try_get("voter_id")?,
        value: VoteValue::try_from(value)
            .map_err(|_| RatingRepositoryError::InvalidVoteValue(value))?,
        voted_at: from_timestamp(voted_at),
    })
}

fn writeup_from_row(row: &PgRow) -> Result<Writeup, RatingRepositoryError> {
    let created_at: OffsetDateTime = row.try_get("created_at")?;

    Ok(Writeup {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        kind: row.try_get("kind")?,
        topic: row.try_get("topic")?,
        url: row.try_get("url")?,
        description: row.try_get("description")?,
        rating: row.try_get("rating")?,
        created_at: from_timestamp(created_at),
    })
}
