//! Collaborator contracts for video metadata and user accounts.
//!
//! The moderation core and the HTTP layer only talk to these traits. Two
//! backends exist: PostgreSQL through sea-orm and an in-process map used by
//! tests and throwaway deployments.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::storage::ObjectId;
use uuid::Uuid;

pub use memory::{MemoryMetadataStore, MemoryUserDirectory};
pub use postgres::{PgMetadataStore, PgUserDirectory};

/// Metadata for one uploaded video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub id: Uuid,
    pub name: String,
    pub uploader_id: Uuid,
    pub uploader_username: String,
    pub description: String,
    pub tags: Vec<String>,
    pub object_id: ObjectId,
    pub content_type: Option<String>,
    pub size: i64,
    pub checksum: String,
    pub flag_count: i32,
    /// Users that flagged this video. Never holds duplicates.
    pub flagged_by: Vec<Uuid>,
    pub posted_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn is_flagged_by(&self, user_id: Uuid) -> bool {
        self.flagged_by.contains(&user_id)
    }
}

/// Constraint on `flag_count` applied by [`VideoFilter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlagRange {
    #[default]
    Any,
    /// `flag_count <= n`
    AtMost(i32),
    /// `flag_count > n`
    Above(i32),
}

impl FlagRange {
    pub fn contains(&self, flag_count: i32) -> bool {
        match *self {
            FlagRange::Any => true,
            FlagRange::AtMost(n) => flag_count <= n,
            FlagRange::Above(n) => flag_count > n,
        }
    }
}

/// Conjunctive filter over video records. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoFilter {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub flags: FlagRange,
}

impl VideoFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_flags(mut self, flags: FlagRange) -> Self {
        self.flags = flags;
        self
    }

    pub fn matches(&self, record: &VideoRecord) -> bool {
        self.id.is_none_or(|id| record.id == id)
            && self.name.as_deref().is_none_or(|name| record.name == name)
            && self.flags.contains(record.flag_count)
    }
}

/// Mutations accepted by [`MetadataStore::update_one`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoUpdate {
    /// Increment `flag_count` and add `user_id` to `flagged_by`, only if
    /// `user_id` is not already a member. Check and write are one atomic step.
    AddFlag { user_id: Uuid },
    /// Zero `flag_count` and empty `flagged_by` together.
    ClearFlags,
}

/// A user account as seen by this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or failed mid-operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),
    /// A stored row could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Document collection holding one [`VideoRecord`] per video.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// All records matching `filter`, oldest first.
    async fn find(&self, filter: &VideoFilter) -> Result<Vec<VideoRecord>, StoreError>;

    async fn find_one(&self, filter: &VideoFilter) -> Result<Option<VideoRecord>, StoreError> {
        Ok(self.find(filter).await?.into_iter().next())
    }

    async fn insert_one(&self, record: VideoRecord) -> Result<Uuid, StoreError>;

    /// Apply `update` to the record with `id`. Returns the matched count
    /// (0 or 1); a conditional update that does not apply matches 0.
    async fn update_one(&self, id: Uuid, update: VideoUpdate) -> Result<u64, StoreError>;

    /// Remove the record with `id` and return it.
    async fn find_one_and_delete(&self, id: Uuid) -> Result<Option<VideoRecord>, StoreError>;
}

/// Read access to user accounts plus the writes the auth endpoints need.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the username is taken.
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    /// Returns `false` when no such user exists.
    async fn set_admin(&self, id: Uuid, is_admin: bool) -> Result<bool, StoreError>;
}
