use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::{
    MetadataStore, NewUser, StoreError, UserDirectory, UserRecord, VideoFilter, VideoRecord,
    VideoUpdate,
};

/// In-process metadata store.
///
/// `update_one` runs under the entry's write guard, which gives the same
/// single-record atomicity the database backend gets from one `UPDATE`.
#[derive(Default)]
pub struct MemoryMetadataStore {
    videos: DashMap<Uuid, VideoRecord>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn find(&self, filter: &VideoFilter) -> Result<Vec<VideoRecord>, StoreError> {
        let mut found: Vec<VideoRecord> = self
            .videos
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| a.posted_at.cmp(&b.posted_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn insert_one(&self, record: VideoRecord) -> Result<Uuid, StoreError> {
        match self.videos.entry(record.id) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "video {} already exists",
                record.id
            ))),
            Entry::Vacant(slot) => {
                let id = record.id;
                slot.insert(record);
                Ok(id)
            }
        }
    }

    async fn update_one(&self, id: Uuid, update: VideoUpdate) -> Result<u64, StoreError> {
        let Some(mut record) = self.videos.get_mut(&id) else {
            return Ok(0);
        };

        match update {
            VideoUpdate::AddFlag { user_id } => {
                if record.is_flagged_by(user_id) {
                    return Ok(0);
                }
                record.flag_count += 1;
                record.flagged_by.push(user_id);
            }
            VideoUpdate::ClearFlags => {
                record.flag_count = 0;
                record.flagged_by.clear();
            }
        }
        Ok(1)
    }

    async fn find_one_and_delete(&self, id: Uuid) -> Result<Option<VideoRecord>, StoreError> {
        Ok(self.videos.remove(&id).map(|(_, record)| record))
    }
}

/// In-process user accounts.
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: DashMap<Uuid, UserRecord>,
    usernames: DashMap<String, Uuid>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let Some(id) = self.usernames.get(username).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let record = UserRecord {
            id: Uuid::now_v7(),
            username: user.username,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
            created_at: Utc::now(),
        };

        match self.usernames.entry(record.username.clone()) {
            Entry::Occupied(_) => {
                return Err(StoreError::Conflict(format!(
                    "username '{}' is taken",
                    record.username
                )));
            }
            Entry::Vacant(slot) => {
                // Publish the account before releasing the username slot so
                // a lookup by name never resolves to a missing id.
                self.users.insert(record.id, record.clone());
                slot.insert(record.id);
            }
        }

        Ok(record)
    }

    async fn set_admin(&self, id: Uuid, is_admin: bool) -> Result<bool, StoreError> {
        match self.users.get_mut(&id) {
            Some(mut user) => {
                user.is_admin = is_admin;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
