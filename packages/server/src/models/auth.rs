use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::store::UserRecord;

pub const USERNAME_CHARS: std::ops::RangeInclusive<usize> = 3..=32;
pub const PASSWORD_BYTES: std::ops::RangeInclusive<usize> = 8..=256;

/// Account details for a new uploader.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// 3-32 characters from `[A-Za-z0-9_.-]`. Shown as the uploader on videos.
    #[schema(example = "beach_cam")]
    pub username: String,
    /// 8-256 bytes.
    #[schema(example = "waves-at-dawn")]
    pub password: String,
}

impl RegisterRequest {
    /// The trimmed username, once both fields pass the account rules.
    pub fn checked_username(&self) -> Result<&str, AppError> {
        let username = self.username.trim();

        if !USERNAME_CHARS.contains(&username.chars().count()) {
            return Err(AppError::Validation(format!(
                "Usernames are {} to {} characters long",
                USERNAME_CHARS.start(),
                USERNAME_CHARS.end()
            )));
        }
        if let Some(bad) = username
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(AppError::Validation(format!(
                "Username contains '{bad}'; use letters, digits, '_', '-' or '.'"
            )));
        }
        if !PASSWORD_BYTES.contains(&self.password.len()) {
            return Err(AppError::Validation(format!(
                "Passwords are {} to {} bytes long",
                PASSWORD_BYTES.start(),
                PASSWORD_BYTES.end()
            )));
        }

        Ok(username)
    }
}

/// Username and password exchanged for a bearer token.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "beach_cam")]
    pub username: String,
    #[schema(example = "waves-at-dawn")]
    pub password: String,
}

impl LoginRequest {
    /// The trimmed username. Blank fields are rejected before any lookup.
    pub fn checked_username(&self) -> Result<&str, AppError> {
        let username = self.username.trim();
        if username.is_empty() || self.password.is_empty() {
            return Err(AppError::Validation(
                "Both username and password are required".into(),
            ));
        }
        Ok(username)
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    pub id: Uuid,
    #[schema(example = "beach_cam")]
    pub username: String,
}

impl From<UserRecord> for RegisterResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// Send as `Authorization: Bearer <token>` on upload, delete and flag calls.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    #[schema(example = "beach_cam")]
    pub username: String,
    /// Whether this account may reset flags and read the moderation queue.
    pub is_admin: bool,
}

/// The account behind the presented token, as currently stored.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub id: Uuid,
    #[schema(example = "beach_cam")]
    pub username: String,
    pub is_admin: bool,
}

impl From<UserRecord> for MeResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
        }
    }
}
