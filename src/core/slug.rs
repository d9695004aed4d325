//! Slug derivation and unique slug assignment for news items.

use crate::{
    entities::{News, news},
    errors::Result,
};
use sea_orm::{ConnectionTrait, PaginatorTrait, prelude::*};
use tracing::debug;

/// Used when a title contains no usable characters.
pub const FALLBACK_SLUG: &str = "news";

/// Derives a URL slug from a title.
///
/// Lowercases, keeps only `a-z`, `0-9`, spaces and hyphens, turns whitespace
/// runs into a hyphen, collapses repeated hyphens, and trims hyphens from both
/// ends. Applying it to its own output returns the same string.
#[must_use]
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        match c {
            'a'..='z' | '0'..='9' => slug.push(c),
            '-' => push_hyphen(&mut slug),
            c if c.is_whitespace() => push_hyphen(&mut slug),
            _ => {}
        }
    }
    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}

fn push_hyphen(slug: &mut String) {
    if !slug.ends_with('-') {
        slug.push('-');
    }
}

/// Returns `base` if unused, otherwise the first free `base-1`, `base-2`, ...
///
/// The probe is not atomic with the later insert; the UNIQUE constraint on
/// `news.slug` catches a concurrent winner and the caller probes again.
pub async fn unique_news_slug<C>(db: &C, title: &str, exclude_id: Option<i64>) -> Result<String>
where
    C: ConnectionTrait,
{
    let base = generate_slug(title);
    let mut candidate = base.clone();
    let mut counter = 1u32;

    while slug_taken(db, &candidate, exclude_id).await? {
        debug!("Slug '{candidate}' is taken");
        candidate = format!("{base}-{counter}");
        counter += 1;
    }

    Ok(candidate)
}

async fn slug_taken<C>(db: &C, slug: &str, exclude_id: Option<i64>) -> Result<bool>
where
    C: ConnectionTrait,
{
    let mut query = News::find().filter(news::Column::Slug.eq(slug));
    if let Some(id) = exclude_id {
        query = query.filter(news::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_generate_slug_basic() {
        assert_eq!(
            generate_slug("Penerimaan Peserta Didik Baru 2025!"),
            "penerimaan-peserta-didik-baru-2025"
        );
    }

    #[test]
    fn test_generate_slug_collapses_hyphens_and_spaces() {
        assert_eq!(generate_slug("  Juara   1 -- Lomba  LKS  "), "juara-1-lomba-lks");
        assert_eq!(generate_slug("a - b"), "a-b");
    }

    #[test]
    fn test_generate_slug_is_idempotent() {
        for title in ["Hari Guru Nasional", "kelas-x-tkj", "2024/2025: Jadwal", "---"] {
            let once = generate_slug(title);
            assert_eq!(generate_slug(&once), once, "title: {title}");
        }
    }

    #[test]
    fn test_generate_slug_drops_non_ascii() {
        assert_eq!(generate_slug("Café Ümlaut"), "caf-mlaut");
    }

    #[test]
    fn test_generate_slug_fallback() {
        assert_eq!(generate_slug("!!!"), FALLBACK_SLUG);
        assert_eq!(generate_slug(""), FALLBACK_SLUG);
    }

    #[tokio::test]
    async fn test_unique_slug_probes_suffixes() -> Result<()> {
        let db = setup_test_db().await?;

        assert_eq!(unique_news_slug(&db, "Upacara", None).await?, "upacara");
        create_test_news(&db, "Upacara").await?;
        assert_eq!(unique_news_slug(&db, "Upacara", None).await?, "upacara-1");
        create_test_news(&db, "Upacara").await?;
        assert_eq!(unique_news_slug(&db, "Upacara!", None).await?, "upacara-2");

        Ok(())
    }

    #[tokio::test]
    async fn test_unique_slug_ignores_own_row() -> Result<()> {
        let db = setup_test_db().await?;
        let item = create_test_news(&db, "Upacara").await?;

        assert_eq!(unique_news_slug(&db, "Upacara", Some(item.id)).await?, "upacara");
        Ok(())
    }
}
