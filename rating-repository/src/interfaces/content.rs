use async_trait::async_trait;
use rating_shared::types::{ItemId, NewWriteup, Writeup, WriteupSort};
use crate::errors::RatingRepositoryError;

/// Storage of the writeups that votes are cast on.
///
/// Role checks are not performed here; see the content service in the engine crate.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Persists a new writeup with a rating of zero.
    async fn create_writeup(&self, writeup: &NewWriteup) -> Result<Writeup, RatingRepositoryError>;

    async fn get_writeup(&self, id: ItemId) -> Result<Option<Writeup>, RatingRepositoryError>;

    /// Deletes a writeup together with all of its vote records.
    ///
    /// Returns `false` if no writeup had that id.
    async fn delete_writeup(&self, id: ItemId) -> Result<bool, RatingRepositoryError>;

    /// Lists writeups in the requested order, at most `limit` of them when given.
    async fn list_writeups(
        &self,
        sort: WriteupSort,
        limit: Option<u32>,
    ) -> Result<Vec<Writeup>, RatingRepositoryError>;
}
