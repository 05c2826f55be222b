use std::sync::Arc;

use chrono::Utc;
use common::storage::{BlobStore, BoxReader, StorageError};
use tracing::{info, warn};
use uuid::Uuid;

use crate::archive::{self, Archive, ArchiveError, Layout};
use crate::error::AppError;
use crate::moderation::{Action, AuthorizationGate, ModerationError, VisibilityPolicy};
use crate::store::{MetadataStore, StoreError, UserRecord, VideoFilter, VideoRecord};

#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error(transparent)]
    Moderation(#[from] ModerationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

impl From<VideoError> for AppError {
    fn from(err: VideoError) -> Self {
        match err {
            VideoError::Moderation(e) => e.into(),
            VideoError::Store(e) => e.into(),
            VideoError::Storage(e) => e.into(),
            VideoError::Archive(ArchiveError::Storage(e)) => e.into(),
            VideoError::Archive(e) => AppError::Internal(e.to_string()),
        }
    }
}

/// Descriptive fields supplied with an upload.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub content_type: Option<String>,
}

/// Upload, lookup and deletion across the metadata and object stores.
#[derive(Clone)]
pub struct VideoService {
    videos: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    gate: AuthorizationGate,
    policy: VisibilityPolicy,
}

impl VideoService {
    pub fn new(
        videos: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        gate: AuthorizationGate,
        policy: VisibilityPolicy,
    ) -> Self {
        Self {
            videos,
            blobs,
            gate,
            policy,
        }
    }

    pub fn policy(&self) -> VisibilityPolicy {
        self.policy
    }

    /// Store the payload, then the metadata record.
    ///
    /// If the record cannot be written the payload is deleted again; a failed
    /// cleanup leaves an orphaned object, which is logged.
    pub async fn upload(
        &self,
        uploader: &UserRecord,
        video: NewVideo,
        payload: BoxReader,
    ) -> Result<VideoRecord, VideoError> {
        let stored = self.blobs.put_stream(payload).await?;

        let record = VideoRecord {
            id: Uuid::now_v7(),
            name: video.name,
            uploader_id: uploader.id,
            uploader_username: uploader.username.clone(),
            description: video.description,
            tags: video.tags,
            object_id: stored.id,
            content_type: video.content_type,
            size: i64::try_from(stored.size).unwrap_or(i64::MAX),
            checksum: stored.checksum,
            flag_count: 0,
            flagged_by: Vec::new(),
            posted_at: Utc::now(),
        };

        if let Err(e) = self.videos.insert_one(record.clone()).await {
            match self.blobs.delete(&stored.id).await {
                Ok(_) => {}
                Err(cleanup) => warn!(
                    object_id = %stored.id,
                    error = %cleanup,
                    "Orphaned object after failed metadata insert"
                ),
            }
            return Err(e.into());
        }

        info!(
            video_id = %record.id,
            object_id = %record.object_id,
            size = record.size,
            "Video uploaded"
        );
        Ok(record)
    }

    /// A single video regardless of flag count.
    pub async fn get(&self, id: Uuid) -> Result<VideoRecord, VideoError> {
        self.videos
            .find_one(&VideoFilter::by_id(id))
            .await?
            .ok_or(VideoError::Moderation(ModerationError::VideoNotFound))
    }

    /// A single video, if it exists and is visible.
    pub async fn find_visible(&self, id: Uuid) -> Result<VideoRecord, VideoError> {
        self.videos
            .find_one(&VideoFilter::by_id(id).with_flags(self.policy.visible()))
            .await?
            .ok_or(VideoError::Moderation(ModerationError::VideoNotFound))
    }

    /// Every visible video, optionally restricted to an exact name.
    pub async fn list_visible(&self, name: Option<&str>) -> Result<Vec<VideoRecord>, VideoError> {
        let mut filter = VideoFilter::all().with_flags(self.policy.visible());
        if let Some(name) = name {
            filter = filter.named(name);
        }
        Ok(self.videos.find(&filter).await?)
    }

    /// Videos above the visibility threshold. Admin only.
    pub async fn moderation_queue(
        &self,
        requester_id: Uuid,
    ) -> Result<Vec<VideoRecord>, VideoError> {
        self.gate.ensure_admin(requester_id).await?;
        Ok(self
            .videos
            .find(&VideoFilter::all().with_flags(self.policy.moderation_queue()))
            .await?)
    }

    /// Remove a video: metadata first, then the payload.
    ///
    /// Works regardless of flag count. Once the record is gone the delete has
    /// succeeded; a payload that cannot be removed is logged as orphaned.
    pub async fn delete(&self, id: Uuid, requester_id: Uuid) -> Result<VideoRecord, VideoError> {
        let record = self
            .videos
            .find_one(&VideoFilter::by_id(id))
            .await?
            .ok_or(ModerationError::VideoNotFound)?;

        if !self
            .gate
            .authorize(Action::Delete, &record, requester_id)
            .await?
        {
            return Err(ModerationError::NotAuthorized.into());
        }

        let removed = self
            .videos
            .find_one_and_delete(id)
            .await?
            .ok_or(ModerationError::VideoNotFound)?;

        match self.blobs.delete(&removed.object_id).await {
            Ok(true) => {}
            Ok(false) => warn!(
                video_id = %removed.id,
                object_id = %removed.object_id,
                "Deleted video had no stored payload"
            ),
            Err(e) => warn!(
                video_id = %removed.id,
                object_id = %removed.object_id,
                error = %e,
                "Orphaned object after video delete"
            ),
        }

        info!(video_id = %removed.id, %requester_id, "Video deleted");
        Ok(removed)
    }

    pub async fn package(
        &self,
        records: Vec<VideoRecord>,
        layout: Layout,
    ) -> Result<Archive, VideoError> {
        Ok(archive::build(self.blobs.clone(), records, layout).await?)
    }
}
