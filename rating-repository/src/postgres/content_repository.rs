//! PostgreSQL storage for writeups.
use async_trait::async_trait;
use rating_shared::types::{ItemId, NewWriteup, Writeup, WriteupSort};
use uuid::Uuid;

use super::writeup_from_row;
use crate::{ContentRepository, RatingRepositoryError};

const WRITEUP_COLUMNS: &str = "id, title, kind, topic, url, description, rating, created_at";

/// PostgreSQL-backed writeup repository.
pub struct PostgresContentRepository {
    pool: sqlx::PgPool,
}

impl PostgresContentRepository {
    pub async fn new(pool: sqlx::PgPool) -> Result<Self, RatingRepositoryError> {
        Ok(Self { pool })
    }
}

fn order_clause(sort: WriteupSort) -> &'static str {
    match sort {
        WriteupSort::Rating => "ORDER BY rating DESC, created_at DESC",
        WriteupSort::Newest => "ORDER BY created_at DESC",
    }
}

#[async_trait]
impl ContentRepository for PostgresContentRepository {
    async fn create_writeup(&self, writeup: &NewWriteup) -> Result<Writeup, RatingRepositoryError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO writeups (id, title, kind, topic, url, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {WRITEUP_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&writeup.title)
        .bind(&writeup.kind)
        .bind(&writeup.topic)
        .bind(&writeup.url)
        .bind(&writeup.description)
        .fetch_one(&self.pool)
        .await?;

        writeup_from_row(&row)
    }

    async fn get_writeup(&self, id: ItemId) -> Result<Option<Writeup>, RatingRepositoryError> {
        let row = sqlx::query(&format!("SELECT {WRITEUP_COLUMNS} FROM writeups WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(writeup_from_row).transpose()
    }

    /// Deletes the writeup and its votes in a single transaction.
    ///
    /// The foreign key already cascades; the votes are removed explicitly so the
    /// cascade does not depend on the schema version.
    async fn delete_writeup(&self, id: ItemId) -> Result<bool, RatingRepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM writeup_votes WHERE writeup_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM writeups WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn list_writeups(
        &self,
        sort: WriteupSort,
        limit: Option<u32>,
    ) -> Result<Vec<Writeup>, RatingRepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {WRITEUP_COLUMNS} FROM writeups {} LIMIT $1",
            order_clause(sort)
        ))
        .bind(limit.map(i64::from))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(writeup_from_row).collect()
    }
}
