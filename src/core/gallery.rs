//! Gallery business logic - photos and videos.

use crate::{
    core::validation::FieldCheck,
    entities::{Gallery, GalleryCategory, MediaType, gallery},
    errors::{Error, Result},
    storage::{Bucket, ObjectStorage},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Values accepted when creating or editing a gallery item.
#[derive(Debug, Clone, Deserialize)]
pub struct GalleryInput {
    /// Caption
    pub title: String,
    /// Longer description
    #[serde(default)]
    pub description: Option<String>,
    /// Photo or video
    #[serde(default = "default_media_type")]
    pub media_type: MediaType,
    /// Location of the media
    pub media_url: String,
    /// Preview image for videos
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Grouping on the public page
    pub category: GalleryCategory,
    /// Highlighted on the home page
    #[serde(default)]
    pub is_featured: bool,
}

const fn default_media_type() -> MediaType {
    MediaType::Image
}

impl GalleryInput {
    fn validate(&self) -> Result<()> {
        let mut check = FieldCheck::new();
        check
            .required("title", &self.title)
            .required("media_url", &self.media_url);
        check.finish()
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Items newest first, optionally restricted to one category.
pub async fn list_gallery(
    db: &DatabaseConnection,
    category: Option<GalleryCategory>,
) -> Result<Vec<gallery::Model>> {
    let mut query = Gallery::find();
    if let Some(category) = category {
        query = query.filter(gallery::Column::Category.eq(category));
    }
    query
        .order_by_desc(gallery::Column::CreatedAt)
        .order_by_desc(gallery::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an item by id.
pub async fn get_gallery_item(db: &DatabaseConnection, id: i64) -> Result<gallery::Model> {
    Gallery::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("gallery item", id))
}

/// Creates an item.
#[instrument(skip(db, input), fields(title = %input.title))]
pub async fn create_gallery_item(
    db: &DatabaseConnection,
    input: GalleryInput,
) -> Result<gallery::Model> {
    input.validate()?;
    let now = Utc::now();
    let item = gallery::ActiveModel {
        title: Set(input.title.trim().to_string()),
        description: Set(optional_text(input.description)),
        media_type: Set(input.media_type),
        media_url: Set(input.media_url.trim().to_string()),
        thumbnail_url: Set(optional_text(input.thumbnail_url)),
        category: Set(input.category),
        is_featured: Set(input.is_featured),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created gallery item {}", item.id);
    Ok(item)
}

/// Replaces the editable fields of an item.
#[instrument(skip(db, input))]
pub async fn update_gallery_item(
    db: &DatabaseConnection,
    id: i64,
    input: GalleryInput,
) -> Result<gallery::Model> {
    input.validate()?;
    let mut model: gallery::ActiveModel = get_gallery_item(db, id).await?.into();
    model.title = Set(input.title.trim().to_string());
    model.description = Set(optional_text(input.description));
    model.media_type = Set(input.media_type);
    model.media_url = Set(input.media_url.trim().to_string());
    model.thumbnail_url = Set(optional_text(input.thumbnail_url));
    model.category = Set(input.category);
    model.is_featured = Set(input.is_featured);
    model.updated_at = Set(Utc::now());
    model.update(db).await.map_err(Into::into)
}

/// Flips the featured flag.
#[instrument(skip(db))]
pub async fn toggle_gallery_featured(db: &DatabaseConnection, id: i64) -> Result<gallery::Model> {
    let item = get_gallery_item(db, id).await?;
    let featured = !item.is_featured;
    let mut model: gallery::ActiveModel = item.into();
    model.is_featured = Set(featured);
    model.updated_at = Set(Utc::now());
    model.update(db).await.map_err(Into::into)
}

/// Deletes an item and, when they live in our storage, its media files.
///
/// File removal is best effort; the row is gone either way.
#[instrument(skip(db, storage))]
pub async fn delete_gallery_item(
    db: &DatabaseConnection,
    storage: &ObjectStorage,
    id: i64,
) -> Result<()> {
    let item = get_gallery_item(db, id).await?;
    let urls: Vec<String> = std::iter::once(item.media_url.clone())
        .chain(item.thumbnail_url.clone())
        .collect();
    item.delete(db).await?;
    info!("Deleted gallery item {id}");

    for url in urls {
        for bucket in [Bucket::Gallery, Bucket::SchoolVideos] {
            let Some(path) = storage.path_from_public_url(bucket, &url) else {
                continue;
            };
            if let Err(e) = storage.remove(bucket, &path).await {
                warn!("Could not remove {url} for gallery item {id}: {e}");
            }
        }
    }
    Ok(())
}
