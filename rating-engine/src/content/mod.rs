//! Writeup management.
//!
//! Listing is open to everyone. Creating and deleting writeups requires an
//! administrator.
use std::sync::Arc;

use rating_repository::ContentRepository;
use rating_shared::types::{ItemId, NewWriteup, Principal, Writeup, WriteupSort};
use tracing::{info, instrument};

use crate::errors::ContentError;

/// Number of writeups shown on the landing page.
pub const DEFAULT_TOP_WRITEUPS: u32 = 4;

pub struct ContentService {
    repository: Arc<dyn ContentRepository>,
}

impl ContentService {
    pub fn new(repository: Arc<dyn ContentRepository>) -> Self {
        Self { repository }
    }

    /// Create a writeup with a rating of zero.
    ///
    /// # Errors
    ///
    /// * `ContentError::Unauthenticated` - If there is no caller
    /// * `ContentError::Forbidden` - If the caller is not an administrator
    /// * `ContentError::Validation` - If the title or url is blank
    #[instrument(skip_all, fields(title = %writeup.title))]
    pub async fn create_writeup(
        &self,
        caller: Option<&Principal>,
        writeup: NewWriteup,
    ) -> Result<Writeup, ContentError> {
        let admin = require_admin(caller)?;
        let writeup = normalize(writeup)?;

        let created = self.repository.create_writeup(&writeup).await?;
        info!(admin = %admin.id, writeup_id = %created.id, "Writeup created");
        Ok(created)
    }

    /// Delete a writeup together with every vote cast on it.
    #[instrument(skip_all, fields(writeup_id = %id))]
    pub async fn delete_writeup(
        &self,
        caller: Option<&Principal>,
        id: ItemId,
    ) -> Result<(), ContentError> {
        let admin = require_admin(caller)?;

        if !self.repository.delete_writeup(id).await? {
            return Err(ContentError::NotFound(id));
        }
        info!(admin = %admin.id, "Writeup deleted");
        Ok(())
    }

    pub async fn get_writeup(&self, id: ItemId) -> Result<Writeup, ContentError> {
        self.repository
            .get_writeup(id)
            .await?
            .ok_or(ContentError::NotFound(id))
    }

    pub async fn list_writeups(
        &self,
        sort: WriteupSort,
        limit: Option<u32>,
    ) -> Result<Vec<Writeup>, ContentError> {
        Ok(self.repository.list_writeups(sort, limit).await?)
    }

    /// The highest rated writeups, newest first among equal ratings.
    pub async fn top_writeups(&self, count: u32) -> Result<Vec<Writeup>, ContentError> {
        self.list_writeups(WriteupSort::Rating, Some(count)).await
    }
}

fn require_admin(caller: Option<&Principal>) -> Result<&Principal, ContentError> {
    match caller {
        None => Err(ContentError::Unauthenticated),
        Some(principal) if !principal.is_admin() => Err(ContentError::Forbidden),
        Some(principal) => Ok(principal),
    }
}

fn normalize(writeup: NewWriteup) -> Result<NewWriteup, ContentError> {
    let title = writeup.title.trim().to_string();
    let url = writeup.url.trim().to_string();

    if title.is_empty() {
        return Err(ContentError::validation("title is required"));
    }
    if url.is_empty() {
        return Err(ContentError::validation("url is required"));
    }

    Ok(NewWriteup {
        title,
        url,
        kind: writeup.kind.trim().to_string(),
        topic: writeup.topic.trim().to_string(),
        description: writeup.description.trim().to_string(),
    })
}
