//! Flagging and authorization: the part of the service with invariants.
//!
//! - a user flags a given video at most once, enforced by a single
//!   conditional update in the metadata store;
//! - deleting a video requires being its uploader or an admin;
//! - resetting a flag counter requires an admin.

mod authz;
mod error;
mod flag;

pub use authz::{Action, AuthorizationGate};
pub use error::ModerationError;
pub use flag::FlagEngine;

use crate::store::{FlagRange, VideoRecord};

/// Flag count above which a video leaves normal retrieval and enters the
/// moderation queue.
pub const DEFAULT_VISIBILITY_THRESHOLD: i32 = 3;

/// Splits videos into "visible" and "moderation queue" by flag count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityPolicy {
    pub threshold: i32,
}

impl VisibilityPolicy {
    pub fn new(threshold: i32) -> Self {
        Self { threshold }
    }

    /// `flag_count <= threshold`
    pub fn is_visible(&self, record: &VideoRecord) -> bool {
        self.visible().contains(record.flag_count)
    }

    /// `flag_count > threshold`
    pub fn is_moderation_flagged(&self, record: &VideoRecord) -> bool {
        self.moderation_queue().contains(record.flag_count)
    }

    pub fn visible(&self) -> FlagRange {
        FlagRange::AtMost(self.threshold)
    }

    pub fn moderation_queue(&self) -> FlagRange {
        FlagRange::Above(self.threshold)
    }
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_THRESHOLD)
    }
}

pub fn is_visible(record: &VideoRecord) -> bool {
    VisibilityPolicy::default().is_visible(record)
}

pub fn is_moderation_flagged(record: &VideoRecord) -> bool {
    VisibilityPolicy::default().is_moderation_flagged(record)
}
