use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::moderation::VisibilityPolicy;
use crate::store::VideoRecord;

pub const MAX_TITLE_CHARS: usize = 256;
pub const MAX_DESCRIPTION_CHARS: usize = 4096;
pub const MAX_TAGS: usize = 32;
pub const MAX_TAG_CHARS: usize = 64;

/// Metadata of a stored video.
#[derive(Serialize, utoipa::ToSchema)]
pub struct VideoResponse {
    pub id: Uuid,
    #[schema(example = "Beach day")]
    pub name: String,
    pub uploader_id: Uuid,
    #[schema(example = "alice_wonder")]
    pub uploader_username: String,
    pub description: String,
    #[schema(example = json!(["sea", "summer"]))]
    pub tags: Vec<String>,
    #[schema(example = "video/mp4")]
    pub content_type: Option<String>,
    /// Payload size in bytes.
    pub size: i64,
    /// SHA-256 of the payload, lowercase hex.
    pub checksum: String,
    pub flag_count: i32,
    pub posted_at: DateTime<Utc>,
}

impl From<VideoRecord> for VideoResponse {
    fn from(record: VideoRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            uploader_id: record.uploader_id,
            uploader_username: record.uploader_username,
            description: record.description,
            tags: record.tags,
            content_type: record.content_type,
            size: record.size,
            checksum: record.checksum,
            flag_count: record.flag_count,
            posted_at: record.posted_at,
        }
    }
}

/// Flag state of a video after a flag or reset.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FlagStateResponse {
    pub video_id: Uuid,
    pub flag_count: i32,
    /// Whether the video still appears in normal retrieval.
    pub visible: bool,
}

impl FlagStateResponse {
    pub fn new(record: &VideoRecord, policy: VisibilityPolicy) -> Self {
        Self {
            video_id: record.id,
            flag_count: record.flag_count,
            visible: policy.is_visible(record),
        }
    }
}

/// Query for `GET /videos/search`.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Exact video name.
    pub name: Option<String>,
}

/// Text fields of an upload form, after trimming.
#[derive(Debug, Default)]
pub struct UploadFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl UploadFields {
    /// Accepts one `tags` form value. Empty values are dropped.
    pub fn push_tag(&mut self, raw: &str) {
        let tag = raw.trim();
        if !tag.is_empty() {
            self.tags.push(tag.to_string());
        }
    }

    /// Returns `(title, description, tags)`.
    pub fn validate(self) -> Result<(String, String, Vec<String>), AppError> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Validation("Missing 'title' field".into()))?;
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::Validation(format!(
                "Title must be 1-{MAX_TITLE_CHARS} characters"
            )));
        }

        let description = self.description.unwrap_or_default().trim().to_string();
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(AppError::Validation(format!(
                "Description must be at most {MAX_DESCRIPTION_CHARS} characters"
            )));
        }

        if self.tags.len() > MAX_TAGS {
            return Err(AppError::Validation(format!(
                "At most {MAX_TAGS} tags are allowed"
            )));
        }
        if self
            .tags
            .iter()
            .any(|t| t.chars().count() > MAX_TAG_CHARS)
        {
            return Err(AppError::Validation(format!(
                "Tags must be at most {MAX_TAG_CHARS} characters"
            )));
        }

        Ok((title, description, self.tags))
    }
}
