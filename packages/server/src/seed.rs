use anyhow::Context;
use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};
use tracing::info;

use crate::config::AdminConfig;
use crate::entity::video;
use crate::store::{NewUser, StoreError, UserDirectory};
use crate::utils::hash;

/// Ensure secondary indexes on `video` exist.
///
/// Schema sync only creates unique indexes, so the lookup indexes used by
/// listing and search are created here.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let indexes = [
        ("idx_video_name", video::Column::Name),
        ("idx_video_flag_count", video::Column::FlagCount),
        ("idx_video_uploader", video::Column::UploaderId),
    ];

    for (name, column) in indexes {
        let stmt = Index::create()
            .if_not_exists()
            .name(name)
            .table(video::Entity)
            .col(column)
            .to_string(PostgresQueryBuilder);

        match db.execute_unprepared(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}

/// Create the configured admin account, or promote it if it already exists.
///
/// Does nothing unless both `admin.username` and `admin.password` are set.
/// An existing account keeps its password.
pub async fn bootstrap_admin(
    users: &dyn UserDirectory,
    config: &AdminConfig,
) -> anyhow::Result<()> {
    let (Some(username), Some(password)) = (&config.username, &config.password) else {
        return Ok(());
    };

    if let Some(existing) = users.find_by_username(username).await? {
        if !existing.is_admin {
            users.set_admin(existing.id, true).await?;
            info!(%username, "Promoted existing account to admin");
        }
        return Ok(());
    }

    let password_hash = hash::hash_password(password)
        .map_err(|e| anyhow::anyhow!("failed to hash admin password: {e}"))?;

    match users
        .create(NewUser {
            username: username.clone(),
            password_hash,
            is_admin: true,
        })
        .await
    {
        Ok(_) => info!(%username, "Created admin account"),
        // Another instance won the race.
        Err(StoreError::Conflict(_)) => {
            let existing = users
                .find_by_username(username)
                .await?
                .context("admin account vanished after conflict")?;
            users.set_admin(existing.id, true).await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
