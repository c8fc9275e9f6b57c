use serde::{Deserialize, Serialize};
use crate::types::ItemId;

/// A published writeup, the rateable item of the site.
///
/// Display fields are owned by the content subsystem; `rating` is only ever
/// changed through the rating aggregator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Writeup {
    pub id: ItemId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub topic: String,
    pub url: String,
    pub description: String,
    pub rating: i64,
    pub created_at: u64,
}

/// Display fields submitted by an admin when creating a writeup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NewWriteup {
    pub title: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub topic: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}

/// Ordering used when listing writeups.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WriteupSort {
    /// Highest rating first, newest first among equal ratings.
    #[default]
    Rating,
    /// Most recently created first.
    Newest,
}
