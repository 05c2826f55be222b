use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::authz::AuthorizationGate;
use super::error::ModerationError;
use crate::store::{MetadataStore, UserDirectory, VideoFilter, VideoUpdate};

/// Records user flags against videos, at most once per user and video.
#[derive(Clone)]
pub struct FlagEngine {
    videos: Arc<dyn MetadataStore>,
    users: Arc<dyn UserDirectory>,
    gate: AuthorizationGate,
}

impl FlagEngine {
    pub fn new(videos: Arc<dyn MetadataStore>, users: Arc<dyn UserDirectory>) -> Self {
        let gate = AuthorizationGate::new(users.clone());
        Self {
            videos,
            users,
            gate,
        }
    }

    /// Add `user_id`'s flag to `video_id`.
    ///
    /// The success path is one conditional update. Only when it matches
    /// nothing does a second lookup decide between `AlreadyFlagged` and
    /// `VideoNotFound`.
    pub async fn flag(&self, video_id: Uuid, user_id: Uuid) -> Result<(), ModerationError> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(ModerationError::UserNotFound);
        }

        let matched = self
            .videos
            .update_one(video_id, VideoUpdate::AddFlag { user_id })
            .await?;

        if matched > 0 {
            info!(%video_id, %user_id, "Video flagged");
            return Ok(());
        }

        match self.videos.find_one(&VideoFilter::by_id(video_id)).await? {
            Some(_) => {
                debug!(%video_id, %user_id, "Repeat flag ignored");
                Err(ModerationError::AlreadyFlagged)
            }
            None => Err(ModerationError::VideoNotFound),
        }
    }

    /// Zero the flag counter and forget who flagged. Admin only.
    pub async fn reset_flags(
        &self,
        video_id: Uuid,
        requester_id: Uuid,
    ) -> Result<(), ModerationError> {
        let admin = self.gate.ensure_admin(requester_id).await?;

        let matched = self
            .videos
            .update_one(video_id, VideoUpdate::ClearFlags)
            .await?;

        if matched == 0 {
            return Err(ModerationError::VideoNotFound);
        }

        info!(%video_id, admin = %admin.username, "Flag counter reset");
        Ok(())
    }
}
