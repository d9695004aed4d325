//! Gallery entity - photos and videos shown on the public site.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether the item is a picture or a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// Still image
    #[sea_orm(string_value = "image")]
    Image,
    /// Video clip
    #[sea_orm(string_value = "video")]
    Video,
}

/// Gallery grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum GalleryCategory {
    /// School facilities
    #[sea_orm(string_value = "facility")]
    Facility,
    /// Student activities
    #[sea_orm(string_value = "activity")]
    Activity,
    /// Achievements and awards
    #[sea_orm(string_value = "achievement")]
    Achievement,
    /// Events
    #[sea_orm(string_value = "event")]
    Event,
}

/// Gallery database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gallery")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Caption title
    pub title: String,
    /// Optional caption text
    pub description: Option<String>,
    /// Image or video
    pub media_type: MediaType,
    /// Public URL of the media file
    pub media_url: String,
    /// Preview image for videos
    pub thumbnail_url: Option<String>,
    /// Grouping used for public filtering
    pub category: GalleryCategory,
    /// Shown on the home page
    pub is_featured: bool,
    /// Creation time
    pub created_at: DateTimeUtc,
    /// Last modification time
    pub updated_at: DateTimeUtc,
}

/// Gallery has no relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
