//! News business logic - articles, announcements, and events.
//!
//! Public readers only ever see published items. Slugs are unique and
//! assigned from the title on create and whenever the title changes.

use crate::{
    core::{slug::unique_news_slug, validation::FieldCheck},
    entities::{News, NewsCategory, news},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, QuerySelect, Set, SqlErr, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Items returned by [`list_published`] when no limit is given
pub const DEFAULT_PUBLISHED_LIMIT: u64 = 10;
/// Items returned by [`list_featured`]
pub const FEATURED_LIMIT: u64 = 3;
/// Slug probes attempted before giving up on a racing insert
const MAX_SLUG_ATTEMPTS: usize = 5;

/// Values accepted when creating or editing a news item.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsInput {
    /// Headline
    pub title: String,
    /// Short summary
    #[serde(default)]
    pub excerpt: Option<String>,
    /// Body
    pub content: String,
    /// Kind of item
    #[serde(default = "default_category")]
    pub category: NewsCategory,
    /// Cover image URL
    #[serde(default)]
    pub featured_image_url: Option<String>,
    /// Visible on the public site
    #[serde(default)]
    pub is_published: bool,
    /// Shown in the featured strip
    #[serde(default)]
    pub is_featured: bool,
}

const fn default_category() -> NewsCategory {
    NewsCategory::News
}

impl NewsInput {
    fn validate(&self) -> Result<()> {
        let mut check = FieldCheck::new();
        check
            .required("title", &self.title)
            .required("content", &self.content)
            .url("featured_image_url", self.featured_image_url.as_deref().filter(|u| !u.starts_with('/')));
        check.finish()
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Published items, newest publication first.
pub async fn list_published(db: &DatabaseConnection, limit: Option<u64>) -> Result<Vec<news::Model>> {
    News::find()
        .filter(news::Column::IsPublished.eq(true))
        .order_by_desc(news::Column::PublishedAt)
        .order_by_desc(news::Column::Id)
        .limit(limit.unwrap_or(DEFAULT_PUBLISHED_LIMIT))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Published and featured items, at most [`FEATURED_LIMIT`].
pub async fn list_featured(db: &DatabaseConnection) -> Result<Vec<news::Model>> {
    News::find()
        .filter(news::Column::IsPublished.eq(true))
        .filter(news::Column::IsFeatured.eq(true))
        .order_by_desc(news::Column::PublishedAt)
        .order_by_desc(news::Column::Id)
        .limit(FEATURED_LIMIT)
        .all(db)
        .await
        .map_err(Into::into)
}

/// A published item by slug; drafts are reported as not found.
pub async fn get_published_by_slug(db: &DatabaseConnection, slug: &str) -> Result<news::Model> {
    News::find()
        .filter(news::Column::Slug.eq(slug))
        .filter(news::Column::IsPublished.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "news",
            key: slug.to_string(),
        })
}

/// Every item for the back office, newest first.
pub async fn list_all_news(db: &DatabaseConnection) -> Result<Vec<news::Model>> {
    News::find()
        .order_by_desc(news::Column::CreatedAt)
        .order_by_desc(news::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an item by id, published or not.
pub async fn get_news(db: &DatabaseConnection, id: i64) -> Result<news::Model> {
    News::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("news", id))
}

/// Creates an item with a freshly assigned slug.
///
/// A concurrent insert can claim the probed slug first; the UNIQUE index then
/// rejects ours and the slug is probed again.
#[instrument(skip(db, input), fields(title = %input.title))]
pub async fn create_news(db: &DatabaseConnection, input: NewsInput) -> Result<news::Model> {
    input.validate()?;
    let now = Utc::now();

    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let slug = unique_news_slug(db, &input.title, None).await?;
        let model = news::ActiveModel {
            title: Set(input.title.trim().to_string()),
            slug: Set(slug.clone()),
            excerpt: Set(optional_text(input.excerpt.clone())),
            content: Set(input.content.clone()),
            category: Set(input.category),
            featured_image_url: Set(optional_text(input.featured_image_url.clone())),
            is_published: Set(input.is_published),
            is_featured: Set(input.is_featured),
            published_at: Set(input.is_published.then_some(now)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match model.insert(db).await {
            Ok(item) => {
                info!("Created news {} with slug '{}'", item.id, item.slug);
                return Ok(item);
            }
            Err(e) if is_unique_violation(&e) => {
                warn!("Slug '{slug}' was taken concurrently (attempt {attempt})");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::Conflict {
        message: format!("could not assign a unique slug for '{}'", input.title.trim()),
    })
}

/// Replaces the editable fields of an item.
///
/// The slug follows a changed title. `published_at` is stamped the first
/// time the item becomes published and kept afterwards.
#[instrument(skip(db, input))]
pub async fn update_news(db: &DatabaseConnection, id: i64, input: NewsInput) -> Result<news::Model> {
    input.validate()?;
    let existing = get_news(db, id).await?;
    let now = Utc::now();
    let title = input.title.trim().to_string();

    let slug = if title == existing.title {
        existing.slug.clone()
    } else {
        unique_news_slug(db, &title, Some(id)).await?
    };
    let published_at = match existing.published_at {
        None if input.is_published => Some(now),
        other => other,
    };

    let mut model: news::ActiveModel = existing.into();
    model.title = Set(title);
    model.slug = Set(slug);
    model.excerpt = Set(optional_text(input.excerpt));
    model.content = Set(input.content);
    model.category = Set(input.category);
    model.featured_image_url = Set(optional_text(input.featured_image_url));
    model.is_published = Set(input.is_published);
    model.is_featured = Set(input.is_featured);
    model.published_at = Set(published_at);
    model.updated_at = Set(now);

    model.update(db).await.map_err(|e| {
        if is_unique_violation(&e) {
            Error::Conflict {
                message: "slug was taken concurrently, retry".to_string(),
            }
        } else {
            e.into()
        }
    })
}

/// Deletes an item.
#[instrument(skip(db))]
pub async fn delete_news(db: &DatabaseConnection, id: i64) -> Result<()> {
    let result = News::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("news", id));
    }
    info!("Deleted news {id}");
    Ok(())
}

/// Publishes or unpublishes; publishing refreshes `published_at`.
#[instrument(skip(db))]
pub async fn toggle_published(db: &DatabaseConnection, id: i64) -> Result<news::Model> {
    let item = get_news(db, id).await?;
    let published = !item.is_published;
    let now = Utc::now();

    let mut model: news::ActiveModel = item.into();
    model.is_published = Set(published);
    if published {
        model.published_at = Set(Some(now));
    }
    model.updated_at = Set(now);
    let updated = model.update(db).await?;
    info!("News {id} published = {published}");
    Ok(updated)
}

/// Flips the featured flag.
#[instrument(skip(db))]
pub async fn toggle_featured(db: &DatabaseConnection, id: i64) -> Result<news::Model> {
    let item = get_news(db, id).await?;
    let featured = !item.is_featured;
    let mut model: news::ActiveModel = item.into();
    model.is_featured = Set(featured);
    model.updated_at = Set(Utc::now());
    model.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn input(title: &str, published: bool) -> NewsInput {
        NewsInput {
            title: title.to_string(),
            excerpt: None,
            content: "Isi berita".to_string(),
            category: NewsCategory::Announcement,
            featured_image_url: None,
            is_published: published,
            is_featured: false,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_unique_slugs() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_news(&db, input("Jadwal Ujian Semester", true)).await?;
        let b = create_news(&db, input("Jadwal Ujian Semester", true)).await?;
        let c = create_news(&db, input("Jadwal ujian semester!", false)).await?;

        assert_eq!(a.slug, "jadwal-ujian-semester");
        assert_eq!(b.slug, "jadwal-ujian-semester-1");
        assert_eq!(c.slug, "jadwal-ujian-semester-2");
        assert!(a.published_at.is_some());
        assert!(c.published_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let mut bad = input(" ", false);
        bad.content = String::new();
        bad.featured_image_url = Some("gambar.jpg".to_string());
        let Err(Error::Validation { fields }) = create_news(&db, bad).await else {
            panic!("expected validation error");
        };
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("content"));
        assert!(fields.contains_key("featured_image_url"));

        // storage-relative urls are fine
        let mut local = input("Foto Kegiatan", false);
        local.featured_image_url = Some("/storage/news-images/news/1.jpg".to_string());
        assert!(create_news(&db, local).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn test_public_queries_hide_drafts() -> Result<()> {
        let db = setup_test_db().await?;
        let draft = create_news(&db, input("Draf Pengumuman", false)).await?;
        let live = create_news(&db, input("Pengumuman Kelulusan", true)).await?;

        let published = list_published(&db, None).await?;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].id, live.id);

        assert!(get_published_by_slug(&db, &live.slug).await.is_ok());
        assert!(matches!(
            get_published_by_slug(&db, &draft.slug).await,
            Err(Error::NotFound { .. })
        ));
        assert_eq!(list_all_news(&db).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_published_limit_and_featured() -> Result<()> {
        let db = setup_test_db().await?;
        for i in 0..5 {
            let mut item = input(&format!("Berita {i}"), true);
            item.is_featured = true;
            create_news(&db, item).await?;
        }

        assert_eq!(list_published(&db, Some(2)).await?.len(), 2);
        assert_eq!(list_published(&db, None).await?.len(), 5);
        assert_eq!(list_featured(&db).await?.len(), FEATURED_LIMIT as usize);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_publishes_and_reslugs() -> Result<()> {
        let db = setup_test_db().await?;
        let item = create_news(&db, input("Lomba LKS", false)).await?;
        create_test_news(&db, "Juara LKS").await?;

        let updated = update_news(&db, item.id, input("Juara LKS", true)).await?;
        assert_eq!(updated.slug, "juara-lks-1");
        let first_published = updated.published_at.unwrap();

        // unpublishing keeps the original timestamp; republishing via update keeps it too
        let hidden = update_news(&db, item.id, input("Juara LKS", false)).await?;
        assert_eq!(hidden.published_at, Some(first_published));
        assert_eq!(hidden.slug, "juara-lks-1");
        let shown = update_news(&db, item.id, input("Juara LKS", true)).await?;
        assert_eq!(shown.published_at, Some(first_published));
        Ok(())
    }

    #[tokio::test]
    async fn test_toggles() -> Result<()> {
        let db = setup_test_db().await?;
        let item = create_news(&db, input("Kunjungan Industri", false)).await?;

        let published = toggle_published(&db, item.id).await?;
        assert!(published.is_published);
        assert!(published.published_at.is_some());

        let hidden = toggle_published(&db, item.id).await?;
        assert!(!hidden.is_published);

        let featured = toggle_featured(&db, item.id).await?;
        assert!(featured.is_featured);

        delete_news(&db, item.id).await?;
        assert!(matches!(get_news(&db, item.id).await, Err(Error::NotFound { .. })));
        Ok(())
    }
}
