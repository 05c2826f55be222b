use axum::Json;
use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use tracing::instrument;
use uuid::Uuid;

use crate::archive::{
    ALL_VIDEOS_ARCHIVE, Archive, FLAGGED_ARCHIVE, Layout, SEARCH_ARCHIVE, single_archive_name,
};
use crate::config::AppConfig;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::video::{FlagStateResponse, SearchQuery, UploadFields, VideoResponse};
use crate::service::NewVideo;
use crate::state::AppState;
use crate::utils::filename::{content_disposition_value, validate_upload_filename};

pub fn upload_body_limit(config: &AppConfig) -> DefaultBodyLimit {
    DefaultBodyLimit::max(config.upload_body_limit())
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Videos",
    operation_id = "uploadVideo",
    summary = "Upload a video",
    description = "Multipart form with a required `video` file and `title`, an optional \
        `description` and any number of `tags` fields. The payload is stored before the \
        metadata record is written.",
    request_body(content_type = "multipart/form-data", description = "Video file and metadata"),
    responses(
        (status = 201, description = "Video stored", body = VideoResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Uploader account missing (USER_NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Storage unavailable (STORE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.user_id))]
pub async fn upload_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let uploader = state
        .users
        .find_by_id(auth_user.user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let mut fields = UploadFields::default();
    let mut spooled: Option<SpooledVideo> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("video") => {
                spooled = Some(
                    spool_field(field, state.config.storage.max_blob_size).await?,
                );
            }
            Some("title") => fields.title = Some(read_text(field, "title").await?),
            Some("description") => {
                fields.description = Some(read_text(field, "description").await?);
            }
            Some("tags") => {
                let tag = read_text(field, "tags").await?;
                fields.push_tag(&tag);
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let spooled =
        spooled.ok_or_else(|| AppError::Validation("Missing 'video' field".into()))?;
    let (name, description, tags) = fields.validate()?;

    let record = state
        .videos
        .upload(
            &uploader,
            NewVideo {
                name,
                description,
                tags,
                content_type: spooled.content_type,
            },
            Box::new(spooled.file),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(VideoResponse::from(record))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Videos",
    operation_id = "downloadAllVideos",
    summary = "Download every visible video",
    description = "ZIP archive with each visible video and its metadata sheet.",
    responses(
        (status = 200, description = "ZIP archive", content_type = "application/zip"),
        (status = 404, description = "No visible videos (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn download_all_videos(State(state): State<AppState>) -> Result<Response, AppError> {
    let records = state.videos.list_visible(None).await?;
    if records.is_empty() {
        return Err(AppError::NotFound("No videos available".into()));
    }

    let archive = state.videos.package(records, Layout::Bulk).await?;
    zip_response(archive, ALL_VIDEOS_ARCHIVE)
}

#[utoipa::path(
    get,
    path = "/search",
    tag = "Videos",
    operation_id = "searchVideos",
    summary = "Download visible videos by exact name",
    params(SearchQuery),
    responses(
        (status = 200, description = "ZIP archive", content_type = "application/zip"),
        (status = 400, description = "Missing name (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No matching videos (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn search_videos(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, AppError> {
    let name = query
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::Validation("Query parameter 'name' is required".into()))?;

    let records = state.videos.list_visible(Some(name)).await?;
    if records.is_empty() {
        return Err(AppError::NotFound(format!("No videos named '{name}'")));
    }

    let archive = state.videos.package(records, Layout::Bulk).await?;
    zip_response(archive, SEARCH_ARCHIVE)
}

#[utoipa::path(
    get,
    path = "/flagged",
    tag = "Videos",
    operation_id = "downloadFlaggedVideos",
    summary = "Download the moderation queue",
    description = "ZIP archive of videos whose flag count is above the visibility threshold. \
        Admin only.",
    responses(
        (status = 200, description = "ZIP archive", content_type = "application/zip"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Queue is empty (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn download_flagged_videos(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let records = state.videos.moderation_queue(auth_user.user_id).await?;
    if records.is_empty() {
        return Err(AppError::NotFound("No flagged videos".into()));
    }

    let archive = state.videos.package(records, Layout::Bulk).await?;
    zip_response(archive, FLAGGED_ARCHIVE)
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Videos",
    operation_id = "downloadVideo",
    summary = "Download one video with its metadata",
    params(("id" = String, Path, description = "Video ID (UUID)")),
    responses(
        (status = 200, description = "ZIP archive", content_type = "application/zip"),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Missing or hidden (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(video_id = %id))]
pub async fn download_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_video_id(&id)?;
    let record = state.videos.find_visible(id).await?;
    let filename = single_archive_name(&record);

    let archive = state.videos.package(vec![record], Layout::Single).await?;
    zip_response(archive, &filename)
}

#[utoipa::path(
    get,
    path = "/{id}/metadata",
    tag = "Videos",
    operation_id = "getVideoMetadata",
    summary = "Metadata of one visible video",
    params(("id" = String, Path, description = "Video ID (UUID)")),
    responses(
        (status = 200, description = "Video metadata", body = VideoResponse),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Missing or hidden (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(video_id = %id))]
pub async fn get_video_metadata(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VideoResponse>, AppError> {
    let id = parse_video_id(&id)?;
    Ok(Json(state.videos.find_visible(id).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Videos",
    operation_id = "deleteVideo",
    summary = "Delete a video",
    description = "Allowed for the uploader and for admins, whatever the flag count.",
    params(("id" = String, Path, description = "Video ID (UUID)")),
    responses(
        (status = 204, description = "Video deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the uploader or an admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video or requester not found (NOT_FOUND, USER_NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(video_id = %id, user_id = %auth_user.user_id))]
pub async fn delete_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_video_id(&id)?;
    state.videos.delete(id, auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/flag",
    tag = "Moderation",
    operation_id = "flagVideo",
    summary = "Flag a video",
    description = "Each user can flag a given video once.",
    params(("id" = String, Path, description = "Video ID (UUID)")),
    responses(
        (status = 200, description = "Flag recorded", body = FlagStateResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Video or user not found (NOT_FOUND, USER_NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already flagged by this user (ALREADY_FLAGGED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(video_id = %id, user_id = %auth_user.user_id))]
pub async fn flag_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FlagStateResponse>, AppError> {
    let id = parse_video_id(&id)?;
    state.flags.flag(id, auth_user.user_id).await?;

    let record = state.videos.get(id).await?;
    Ok(Json(FlagStateResponse::new(&record, state.videos.policy())))
}

#[utoipa::path(
    post,
    path = "/{id}/reset-flags",
    tag = "Moderation",
    operation_id = "resetVideoFlags",
    summary = "Reset a video's flags",
    description = "Zeroes the flag counter and forgets who flagged. Admin only.",
    params(("id" = String, Path, description = "Video ID (UUID)")),
    responses(
        (status = 200, description = "Flags cleared", body = FlagStateResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video or user not found (NOT_FOUND, USER_NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(video_id = %id, user_id = %auth_user.user_id))]
pub async fn reset_video_flags(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FlagStateResponse>, AppError> {
    let id = parse_video_id(&id)?;
    state.flags.reset_flags(id, auth_user.user_id).await?;

    let record = state.videos.get(id).await?;
    Ok(Json(FlagStateResponse::new(&record, state.videos.policy())))
}

fn parse_video_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation("Invalid video ID".into()))
}

/// Stream a finished archive back as a download.
fn zip_response(archive: Archive, filename: &str) -> Result<Response, AppError> {
    let file = tokio::fs::File::from_std(archive.file);
    let body = Body::from_stream(ReaderStream::new(file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(header::CONTENT_LENGTH, archive.len.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(filename),
        )
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// An uploaded payload held in an anonymous temp file, rewound for reading.
struct SpooledVideo {
    file: tokio::fs::File,
    content_type: Option<String>,
}

/// Copy a multipart file field into an anonymous temp file.
///
/// The size limit is enforced while reading so an oversized upload is
/// rejected before anything reaches the object store.
async fn spool_field(mut field: Field<'_>, max_size: u64) -> Result<SpooledVideo, AppError> {
    let content_type = field_content_type(&field)?;

    let temp = tempfile::tempfile()
        .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;
    let mut file = tokio::fs::File::from_std(temp);
    let mut total_size: u64 = 0;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        total_size += chunk.len() as u64;
        if total_size > max_size {
            return Err(AppError::Validation(format!(
                "Video exceeds maximum size of {max_size} bytes"
            )));
        }
        file.write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
    }

    if total_size == 0 {
        return Err(AppError::Validation("Video file is empty".into()));
    }

    file.flush()
        .await
        .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;
    file.rewind()
        .await
        .map_err(|e| AppError::Internal(format!("Temp file rewind failed: {e}")))?;

    Ok(SpooledVideo { file, content_type })
}

/// Declared part type, or a guess from the filename when the client sent a
/// generic one.
fn field_content_type(field: &Field<'_>) -> Result<Option<String>, AppError> {
    let declared = field
        .content_type()
        .filter(|ct| !ct.eq_ignore_ascii_case("application/octet-stream"))
        .map(str::to_string);
    if declared.is_some() {
        return Ok(declared);
    }

    match field.file_name() {
        Some(name) => {
            let name = validate_upload_filename(name)
                .map_err(|e| AppError::Validation(e.message().into()))?;
            Ok(mime_guess::from_path(name).first().map(|m| m.to_string()))
        }
        None => Ok(None),
    }
}

async fn read_text(field: Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read '{name}': {e}")))
}
