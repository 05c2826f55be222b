use std::sync::Arc;

use common::storage::BlobStore;

use crate::config::AppConfig;
use crate::moderation::{AuthorizationGate, FlagEngine, VisibilityPolicy};
use crate::service::VideoService;
use crate::store::{MetadataStore, UserDirectory};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub users: Arc<dyn UserDirectory>,
    pub videos: VideoService,
    pub flags: FlagEngine,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        videos: Arc<dyn MetadataStore>,
        users: Arc<dyn UserDirectory>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let policy = VisibilityPolicy::new(config.moderation.visibility_threshold);
        let gate = AuthorizationGate::new(users.clone());

        Self {
            videos: VideoService::new(videos.clone(), blobs, gate, policy),
            flags: FlagEngine::new(videos, users.clone()),
            users,
            config,
        }
    }
}
