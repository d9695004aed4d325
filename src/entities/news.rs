//! News entity - articles, announcements and events.
//!
//! `slug` is unique; public lookups go through it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of news item
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum NewsCategory {
    /// Regular news article
    #[sea_orm(string_value = "news")]
    News,
    /// Official announcement
    #[sea_orm(string_value = "announcement")]
    Announcement,
    /// Event report or invitation
    #[sea_orm(string_value = "event")]
    Event,
}

/// News database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "news")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Headline
    pub title: String,
    /// URL slug derived from the title, unique across all news
    #[sea_orm(unique)]
    pub slug: String,
    /// Short summary for listings
    pub excerpt: Option<String>,
    /// Full article body
    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// Category
    pub category: NewsCategory,
    /// Public URL of the cover image
    pub featured_image_url: Option<String>,
    /// Visible on the public site
    pub is_published: bool,
    /// Shown in the featured strip on the home page
    pub is_featured: bool,
    /// Set when the item is published
    pub published_at: Option<DateTimeUtc>,
    /// Creation time
    pub created_at: DateTimeUtc,
    /// Last modification time
    pub updated_at: DateTimeUtc,
}

/// News has no relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
