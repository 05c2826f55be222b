use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::error::ModerationError;
use crate::store::{UserDirectory, UserRecord, VideoRecord};

/// Privileged operations on a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Delete,
    ResetFlags,
}

impl Action {
    /// The decision itself: a pure function of action, record and requester.
    pub fn permits(self, record: &VideoRecord, user: &UserRecord) -> bool {
        match self {
            Action::Delete => user.id == record.uploader_id || user.is_admin,
            Action::ResetFlags => user.is_admin,
        }
    }
}

/// Resolves requesters against the user directory and applies [`Action::permits`].
///
/// Holds no state of its own.
#[derive(Clone)]
pub struct AuthorizationGate {
    users: Arc<dyn UserDirectory>,
}

impl AuthorizationGate {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }

    pub async fn authorize(
        &self,
        action: Action,
        record: &VideoRecord,
        requester_id: Uuid,
    ) -> Result<bool, ModerationError> {
        let user = self.resolve(requester_id).await?;
        let allowed = action.permits(record, &user);
        debug!(
            ?action,
            video_id = %record.id,
            requester = %user.username,
            allowed,
            "Authorization decision"
        );
        Ok(allowed)
    }

    /// Admin check for actions that do not depend on a particular record.
    pub async fn ensure_admin(&self, requester_id: Uuid) -> Result<UserRecord, ModerationError> {
        let user = self.resolve(requester_id).await?;
        if user.is_admin {
            Ok(user)
        } else {
            debug!(requester = %user.username, "Admin check failed");
            Err(ModerationError::NotAuthorized)
        }
    }

    async fn resolve(&self, requester_id: Uuid) -> Result<UserRecord, ModerationError> {
        self.users
            .find_by_id(requester_id)
            .await?
            .ok_or(ModerationError::UserNotFound)
    }
}
