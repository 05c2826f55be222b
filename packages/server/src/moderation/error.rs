use crate::store::StoreError;

/// Outcomes of moderation operations other than success.
///
/// None of these are retried internally. `StoreUnavailable` is the only
/// transient variant.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error("user not found")]
    UserNotFound,
    #[error("video not found")]
    VideoNotFound,
    #[error("user has already flagged this video")]
    AlreadyFlagged,
    #[error("not authorized")]
    NotAuthorized,
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}
