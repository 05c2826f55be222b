use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "video")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name; not unique.
    pub name: String,

    pub uploader_id: Uuid,

    /// Denormalized for metadata listings.
    pub uploader_username: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub tags: Vec<String>,

    /// Hex id of the payload in the object store.
    #[sea_orm(unique)]
    pub object_id: String,

    pub content_type: Option<String>,

    pub size: i64,

    /// SHA-256 of the payload, lowercase hex.
    pub checksum: String,

    pub flag_count: i32,

    pub flagged_by: Vec<Uuid>,

    pub posted_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
