use async_trait::async_trait;
use chrono::Utc;
use common::storage::ObjectId;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Select, Set, SqlErr,
};
use uuid::Uuid;

use super::{
    FlagRange, MetadataStore, NewUser, StoreError, UserDirectory, UserRecord, VideoFilter,
    VideoRecord, VideoUpdate,
};
use crate::entity::{user, video};

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => StoreError::Conflict(detail),
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

impl TryFrom<video::Model> for VideoRecord {
    type Error = StoreError;

    fn try_from(model: video::Model) -> Result<Self, Self::Error> {
        let object_id = ObjectId::from_hex(&model.object_id).map_err(|e| {
            StoreError::Corrupt(format!("video {} has bad object id: {e}", model.id))
        })?;

        Ok(Self {
            id: model.id,
            name: model.name,
            uploader_id: model.uploader_id,
            uploader_username: model.uploader_username,
            description: model.description,
            tags: model.tags,
            object_id,
            content_type: model.content_type,
            size: model.size,
            checksum: model.checksum,
            flag_count: model.flag_count,
            flagged_by: model.flagged_by,
            posted_at: model.posted_at,
        })
    }
}

impl From<VideoRecord> for video::ActiveModel {
    fn from(record: VideoRecord) -> Self {
        Self {
            id: Set(record.id),
            name: Set(record.name),
            uploader_id: Set(record.uploader_id),
            uploader_username: Set(record.uploader_username),
            description: Set(record.description),
            tags: Set(record.tags),
            object_id: Set(record.object_id.to_hex()),
            content_type: Set(record.content_type),
            size: Set(record.size),
            checksum: Set(record.checksum),
            flag_count: Set(record.flag_count),
            flagged_by: Set(record.flagged_by),
            posted_at: Set(record.posted_at),
        }
    }
}

impl From<user::Model> for UserRecord {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            password_hash: model.password,
            is_admin: model.is_admin,
            created_at: model.created_at,
        }
    }
}

/// PostgreSQL-backed [`MetadataStore`].
#[derive(Clone)]
pub struct PgMetadataStore {
    db: DatabaseConnection,
}

impl PgMetadataStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn select(filter: &VideoFilter) -> Select<video::Entity> {
        let mut query = video::Entity::find();

        if let Some(id) = filter.id {
            query = query.filter(video::Column::Id.eq(id));
        }
        if let Some(name) = &filter.name {
            query = query.filter(video::Column::Name.eq(name.as_str()));
        }
        query = match filter.flags {
            FlagRange::Any => query,
            FlagRange::AtMost(n) => query.filter(video::Column::FlagCount.lte(n)),
            FlagRange::Above(n) => query.filter(video::Column::FlagCount.gt(n)),
        };

        query
            .order_by_asc(video::Column::PostedAt)
            .order_by_asc(video::Column::Id)
    }
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    async fn find(&self, filter: &VideoFilter) -> Result<Vec<VideoRecord>, StoreError> {
        Self::select(filter)
            .all(&self.db)
            .await?
            .into_iter()
            .map(VideoRecord::try_from)
            .collect()
    }

    async fn find_one(&self, filter: &VideoFilter) -> Result<Option<VideoRecord>, StoreError> {
        Self::select(filter)
            .one(&self.db)
            .await?
            .map(VideoRecord::try_from)
            .transpose()
    }

    async fn insert_one(&self, record: VideoRecord) -> Result<Uuid, StoreError> {
        let id = record.id;
        video::Entity::insert(video::ActiveModel::from(record))
            .exec_without_returning(&self.db)
            .await?;
        Ok(id)
    }

    async fn update_one(&self, id: Uuid, update: VideoUpdate) -> Result<u64, StoreError> {
        let query = video::Entity::update_many().filter(video::Column::Id.eq(id));

        let query = match update {
            // Membership test and append happen in the same UPDATE, so two
            // concurrent flags from one user cannot both match.
            VideoUpdate::AddFlag { user_id } => query
                .col_expr(video::Column::FlagCount, Expr::cust("\"flag_count\" + 1"))
                .col_expr(
                    video::Column::FlaggedBy,
                    Expr::cust_with_values("array_append(\"flagged_by\", $1)", [user_id]),
                )
                .filter(Expr::cust_with_values(
                    "NOT ($1 = ANY(\"flagged_by\"))",
                    [user_id],
                )),
            VideoUpdate::ClearFlags => query
                .col_expr(video::Column::FlagCount, Expr::value(0))
                .col_expr(video::Column::FlaggedBy, Expr::cust("'{}'::uuid[]")),
        };

        Ok(query.exec(&self.db).await?.rows_affected)
    }

    async fn find_one_and_delete(&self, id: Uuid) -> Result<Option<VideoRecord>, StoreError> {
        video::Entity::delete_many()
            .filter(video::Column::Id.eq(id))
            .exec_with_returning(&self.db)
            .await?
            .into_iter()
            .next()
            .map(VideoRecord::try_from)
            .transpose()
    }
}

/// PostgreSQL-backed [`UserDirectory`].
#[derive(Clone)]
pub struct PgUserDirectory {
    db: DatabaseConnection,
}

impl PgUserDirectory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        Ok(user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(UserRecord::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .map(UserRecord::from))
    }

    async fn create(&self, new_user: NewUser) -> Result<UserRecord, StoreError> {
        let model = user::ActiveModel {
            id: Set(Uuid::now_v7()),
            username: Set(new_user.username),
            password: Set(new_user.password_hash),
            is_admin: Set(new_user.is_admin),
            created_at: Set(Utc::now()),
        };

        Ok(model.insert(&self.db).await?.into())
    }

    async fn set_admin(&self, id: Uuid, is_admin: bool) -> Result<bool, StoreError> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::IsAdmin, Expr::value(is_admin))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
