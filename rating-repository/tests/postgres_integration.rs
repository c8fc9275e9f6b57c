//! Integration tests for the PostgreSQL rating repository implementation.
//!
//! These tests require a real PostgreSQL database and use SQLx test macros
//! to ensure proper test isolation and cleanup. They are ignored by default.
//!
//! Run with: `DATABASE_URL=postgres://... cargo test --test postgres_integration -- --ignored`

use rating_repository::{
    ContentRepository, PostgresContentRepository, PostgresVotingRepository, RatingAggregator,
    RatingRepositoryError, VoteStore, VotingRepository, VotingUnitOfWork,
};
use rating_shared::types::{NewWriteup, UserVote, VoteValue, WriteupSort};
use sqlx::Row;
use uuid::Uuid;

/// Creates test writeup fields with default values.
fn make_new_writeup(title: &str) -> NewWriteup {
    NewWriteup {
        title: title.to_string(),
        kind: "writeup".to_string(),
        topic: "web".to_string(),
        url: "https://example.com/writeups/1".to_string(),
        description: "SSRF through PDF rendering".to_string(),
    }
}

/// Creates a test user vote with default values.
fn make_user_vote(item_id: Uuid, voter_id: &str, value: VoteValue) -> UserVote {
    UserVote {
        item_id,
        voter_id: voter_id.to_string(),
        value,
        voted_at: 1755182913,
    }
}

async fn repositories(pool: &sqlx::PgPool) -> (PostgresVotingRepository, PostgresContentRepository) {
    (
        PostgresVotingRepository::new(pool.clone()).await.unwrap(),
        PostgresContentRepository::new(pool.clone()).await.unwrap(),
    )
}

// ============================================================================
// Writeup Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_create_writeup_starts_at_zero(pool: sqlx::PgPool) {
    let (_, content) = repositories(&pool).await;

    let writeup = content.create_writeup(&make_new_writeup("first")).await.unwrap();

    assert_eq!(writeup.rating, 0);
    assert_eq!(writeup.title, "first");
    assert_eq!(content.get_writeup(writeup.id).await.unwrap(), Some(writeup));
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_list_writeups_sorted_by_rating(pool: sqlx::PgPool) {
    let (voting, content) = repositories(&pool).await;
    let low = content.create_writeup(&make_new_writeup("low")).await.unwrap();
    let high = content.create_writeup(&make_new_writeup("high")).await.unwrap();

    let mut uow = voting.begin().await.unwrap();
    uow.apply_delta(high.id, 3).await.unwrap();
    uow.apply_delta(low.id, -1).await.unwrap();
    uow.commit().await.unwrap();

    let listed = content.list_writeups(WriteupSort::Rating, None).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, high.id);
    assert_eq!(listed[0].rating, 3);
    assert_eq!(listed[1].id, low.id);

    let limited = content.list_writeups(WriteupSort::Rating, Some(1)).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_delete_writeup_cascades_votes(pool: sqlx::PgPool) {
    let (voting, content) = repositories(&pool).await;
    let writeup = content.create_writeup(&make_new_writeup("doomed")).await.unwrap();

    let mut uow = voting.begin().await.unwrap();
    uow.put_vote(&make_user_vote(writeup.id, "alice", VoteValue::Up)).await.unwrap();
    uow.apply_delta(writeup.id, 1).await.unwrap();
    uow.commit().await.unwrap();

    assert!(content.delete_writeup(writeup.id).await.unwrap());
    assert!(!content.delete_writeup(writeup.id).await.unwrap());

    let votes = sqlx::query("SELECT COUNT(*) AS n FROM writeup_votes WHERE writeup_id = $1")
        .bind(writeup.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(votes.get::<i64, _>("n"), 0);
}

// ============================================================================
// Vote Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_put_vote_upserts(pool: sqlx::PgPool) {
    let (voting, content) = repositories(&pool).await;
    let writeup = content.create_writeup(&make_new_writeup("votes")).await.unwrap();

    let mut uow = voting.begin().await.unwrap();
    assert_eq!(uow.get_vote(writeup.id, "alice").await.unwrap(), None);
    uow.put_vote(&make_user_vote(writeup.id, "alice", VoteValue::Up)).await.unwrap();
    uow.commit().await.unwrap();

    let updated = UserVote {
        value: VoteValue::Retracted,
        voted_at: 1755182914,
        ..make_user_vote(writeup.id, "alice", VoteValue::Up)
    };
    let mut uow = voting.begin().await.unwrap();
    uow.put_vote(&updated).await.unwrap();
    uow.commit().await.unwrap();

    assert_eq!(voting.get_vote(writeup.id, "alice").await.unwrap(), Some(updated));

    let rows = sqlx::query("SELECT * FROM writeup_votes")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_uncommitted_unit_of_work_rolls_back(pool: sqlx::PgPool) {
    let (voting, content) = repositories(&pool).await;
    let writeup = content.create_writeup(&make_new_writeup("rollback")).await.unwrap();

    {
        let mut uow = voting.begin().await.unwrap();
        uow.get_vote(writeup.id, "alice").await.unwrap();
        uow.put_vote(&make_user_vote(writeup.id, "alice", VoteValue::Down)).await.unwrap();
        assert_eq!(uow.apply_delta(writeup.id, -1).await.unwrap(), -1);
    }

    assert_eq!(voting.get_rating(writeup.id).await.unwrap(), Some(0));
    assert_eq!(voting.get_vote(writeup.id, "alice").await.unwrap(), None);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_missing_item_is_reported(pool: sqlx::PgPool) {
    let (voting, _) = repositories(&pool).await;
    let missing = Uuid::new_v4();

    let mut uow = voting.begin().await.unwrap();
    let result = uow.apply_delta(missing, 1).await;
    assert!(matches!(result, Err(RatingRepositoryError::ItemNotFound(id)) if id == missing));

    let mut uow = voting.begin().await.unwrap();
    let result = uow.put_vote(&make_user_vote(missing, "alice", VoteValue::Up)).await;
    assert!(matches!(result, Err(RatingRepositoryError::ItemNotFound(_))));

    assert_eq!(voting.get_rating(missing).await.unwrap(), None);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_invalid_stored_vote_value(pool: sqlx::PgPool) {
    let (voting, content) = repositories(&pool).await;
    let writeup = content.create_writeup(&make_new_writeup("corrupt")).await.unwrap();

    // The CHECK constraint protects the column; drop it to simulate legacy data.
    sqlx::query("ALTER TABLE writeup_votes DROP CONSTRAINT writeup_votes_value_check")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO writeup_votes (writeup_id, voter_id, value, voted_at) VALUES ($1, 'alice', 5, now())")
        .bind(writeup.id)
        .execute(&pool)
        .await
        .unwrap();

    let result = voting.get_vote(writeup.id, "alice").await;
    assert!(matches!(result, Err(RatingRepositoryError::InvalidVoteValue(5))));
}
